//! Codec error types.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding media payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Not a data URI: {0}")]
    NotDataUri(String),

    #[error("Malformed data URI: {0}")]
    MalformedDataUri(String),

    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("HTTP Error: {0}")]
    HttpStatus(u16),
}
