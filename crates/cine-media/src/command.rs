//! FFmpeg argument builder and the two command shapes used by export.
//!
//! Commands are built as plain argument vectors over file names relative to
//! the engine's scratch directory. Global flags (`-y`, log level, progress
//! pipe) are added by the engine that runs them.

use std::path::PathBuf;

use cine_codec::PCM_SAMPLE_RATE;

use crate::error::{MediaError, MediaResult};

/// Output frame size of every segment.
pub const OUTPUT_WIDTH: u32 = 1280;
pub const OUTPUT_HEIGHT: u32 = 720;

/// Scale to fit 1280x720 preserving aspect ratio, then letterbox.
pub fn letterbox_filter() -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = OUTPUT_WIDTH,
        h = OUTPUT_HEIGHT
    )
}

#[derive(Debug, Clone)]
struct Input {
    args: Vec<String>,
    path: String,
}

/// Builder for FFmpeg commands with any number of inputs.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<Input>,
    output_args: Vec<String>,
    output: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            inputs: Vec::new(),
            output_args: Vec::new(),
            output: output.into(),
        }
    }

    /// Add an input preceded by its input options.
    pub fn input_with<I, S>(mut self, args: I, path: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(Input {
            args: args.into_iter().map(Into::into).collect(),
            path: path.into(),
        });
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Set pixel format.
    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Copy all streams without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Output file name.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.clone());

        args
    }
}

/// Encode one still image held for `duration_secs` over raw PCM16 mono audio.
pub fn segment_command(image: &str, audio: &str, output: &str, duration_secs: f64) -> FfmpegCommand {
    let duration = format!("{:.3}", duration_secs);
    let sample_rate = PCM_SAMPLE_RATE.to_string();

    FfmpegCommand::new(output)
        .input_with(["-loop", "1", "-t", duration.as_str()], image)
        .input_with(["-f", "s16le", "-ar", sample_rate.as_str(), "-ac", "1"], audio)
        .video_codec("libx264")
        .audio_codec("aac")
        .audio_bitrate("128k")
        .pixel_format("yuv420p")
        .video_filter(letterbox_filter())
}

/// Splice the segments listed in `list` without re-encoding.
pub fn concat_command(list: &str, output: &str) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input_with(["-f", "concat", "-safe", "0"], list)
        .stream_copy()
}

/// Render a concat demuxer list, one `file` line per segment, in order.
pub fn concat_list<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|name| format!("file '{}'", name.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse segment names back out of a concat list.
pub fn parse_concat_list(list: &str) -> Vec<String> {
    list.lines()
        .filter_map(|line| line.trim().strip_prefix("file "))
        .map(|name| name.trim().trim_matches('\'').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_command_args() {
        let args = segment_command("img0.png", "aud0.raw", "segment-0.mp4", 2.5).build_args();

        assert_eq!(
            &args[..6],
            &["-loop", "1", "-t", "2.500", "-i", "img0.png"]
        );
        assert_eq!(
            &args[6..14],
            &["-f", "s16le", "-ar", "24000", "-ac", "1", "-i", "aud0.raw"]
        );
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "128k"]));
        assert!(args.windows(2).any(|w| w == ["-pix_fmt", "yuv420p"]));
        assert!(args.contains(&letterbox_filter()));
        assert_eq!(args.last().map(String::as_str), Some("segment-0.mp4"));
    }

    #[test]
    fn test_concat_command_args() {
        let args = concat_command("list.txt", "output.mp4").build_args();
        assert_eq!(
            args,
            vec!["-f", "concat", "-safe", "0", "-i", "list.txt", "-c", "copy", "output.mp4"]
        );
    }

    #[test]
    fn test_concat_list_round_trip() {
        let names = ["segment-0.mp4", "segment-1.mp4", "segment-2.mp4"];
        let list = concat_list(&names);
        assert_eq!(
            list,
            "file 'segment-0.mp4'\nfile 'segment-1.mp4'\nfile 'segment-2.mp4'"
        );
        assert_eq!(parse_concat_list(&list), names);
    }

    #[test]
    fn test_letterbox_filter() {
        assert_eq!(
            letterbox_filter(),
            "scale=1280:720:force_original_aspect_ratio=decrease,pad=1280:720:(ow-iw)/2:(oh-ih)/2"
        );
    }
}
