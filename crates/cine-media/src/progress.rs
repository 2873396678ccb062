//! FFmpeg progress parsing.

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg's `-progress` stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Fraction of `total_secs` encoded so far, in `0.0..=1.0`.
    ///
    /// A completed command always reports `1.0`; an unknown duration reports
    /// `0.0` until completion.
    pub fn fraction(&self, total_secs: Option<f64>) -> f64 {
        if self.is_complete {
            return 1.0;
        }
        match total_secs {
            Some(total) if total > 0.0 => {
                ((self.out_time_ms as f64 / 1000.0) / total).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

/// Parse one line of `-progress` output into `current`.
///
/// Returns a snapshot at each `progress=` line, which terminates a block.
pub fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;

    match key {
        "out_time_ms" | "out_time_us" => {
            // Despite its name, out_time_ms is reported in microseconds too.
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            return Some(current.clone());
        }
        _ => {}
    }

    None
}

/// True if the line belongs to the `-progress` key/value stream.
pub fn is_progress_line(line: &str) -> bool {
    line.split_once('=')
        .is_some_and(|(key, _)| !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_parsing() {
        let mut progress = FfmpegProgress::default();

        assert!(parse_progress_line("out_time_us=2500000", &mut progress).is_none());
        assert_eq!(progress.out_time_ms, 2500);

        assert!(parse_progress_line("speed=1.5x", &mut progress).is_none());
        assert_eq!(progress.out_time_ms, 2500);

        let snapshot = parse_progress_line("progress=continue", &mut progress).unwrap();
        assert!(!snapshot.is_complete);
        assert!((snapshot.fraction(Some(5.0)) - 0.5).abs() < 1e-9);

        let snapshot = parse_progress_line("progress=end", &mut progress).unwrap();
        assert!(snapshot.is_complete);
        assert_eq!(snapshot.fraction(Some(5.0)), 1.0);
    }

    #[test]
    fn test_fraction_clamps_and_handles_unknown_duration() {
        let progress = FfmpegProgress {
            out_time_ms: 9000,
            ..Default::default()
        };
        assert_eq!(progress.fraction(Some(3.0)), 1.0);
        assert_eq!(progress.fraction(None), 0.0);
        assert_eq!(progress.fraction(Some(0.0)), 0.0);
    }

    #[test]
    fn test_progress_line_detection() {
        assert!(is_progress_line("out_time_us=1000"));
        assert!(is_progress_line("progress=end"));
        assert!(!is_progress_line("[aac @ 0x55] Too many packets buffered"));
        assert!(!is_progress_line("Error opening input file img0.png."));
    }
}
