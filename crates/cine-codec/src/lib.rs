//! Codec utilities shared by generation and export.
//!
//! This crate provides:
//! - `data:` URI parsing and base64 helpers
//! - PCM16 duration calculation with a safe fallback
//! - Image resolution (data URI or remote URL) with placeholder fallback

pub mod data_uri;
pub mod error;
pub mod fetch;
pub mod pcm;

pub use data_uri::{decode_base64, encode_base64, DataUri};
pub use error::{CodecError, CodecResult};
pub use fetch::{get_image_bytes, to_base64, InlinePayload, PLACEHOLDER_PNG};
pub use pcm::{pcm16_duration_seconds, FALLBACK_DURATION_SECS, PCM_SAMPLE_RATE};
