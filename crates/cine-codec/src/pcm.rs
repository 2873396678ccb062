//! PCM16 duration calculation.

use tracing::warn;

use crate::data_uri::decode_base64;

/// Sample rate of synthesized speech (mono PCM16).
pub const PCM_SAMPLE_RATE: u32 = 24_000;

/// Duration assumed when PCM data cannot be interpreted.
pub const FALLBACK_DURATION_SECS: f64 = 5.0;

const BYTES_PER_SAMPLE: usize = 2;

/// Compute the duration of base64-encoded mono PCM16 (little-endian) audio.
///
/// Never fails: undecodable base64, an empty buffer, a byte count that is not
/// a whole number of samples, or a zero sample rate all yield
/// [`FALLBACK_DURATION_SECS`]. The result only sizes video segments, so an
/// approximate value is acceptable.
pub fn pcm16_duration_seconds(base64_pcm: &str, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        warn!("PCM sample rate is zero, defaulting to {FALLBACK_DURATION_SECS}s");
        return FALLBACK_DURATION_SECS;
    }

    let bytes = match decode_base64(base64_pcm) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not decode PCM audio ({e}), defaulting to {FALLBACK_DURATION_SECS}s");
            return FALLBACK_DURATION_SECS;
        }
    };

    if bytes.is_empty() || bytes.len() % BYTES_PER_SAMPLE != 0 {
        warn!(
            bytes = bytes.len(),
            "PCM buffer is not a whole number of 16-bit samples, defaulting to {FALLBACK_DURATION_SECS}s"
        );
        return FALLBACK_DURATION_SECS;
    }

    let sample_count = bytes.len() / BYTES_PER_SAMPLE;
    sample_count as f64 / sample_rate as f64
}
