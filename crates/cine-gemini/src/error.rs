//! Gateway error types.

use thiserror::Error;

pub type GeminiResult<T> = Result<T, GeminiError>;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Rate limited by provider (HTTP {status}): {message}")]
    RateLimited { status: u16, message: String },

    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Max retries exceeded after {attempts} attempts: {last}")]
    MaxRetriesExceeded {
        attempts: u32,
        last: Box<GeminiError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GeminiError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map a non-success HTTP status and body to an error.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        if status == 429 {
            Self::RateLimited { status, message }
        } else {
            Self::Api { status, message }
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            GeminiError::RateLimited { status, .. } | GeminiError::Api { status, .. } => {
                Some(*status)
            }
            GeminiError::Network(e) => e.status().map(|s| s.as_u16()),
            GeminiError::MaxRetriesExceeded { last, .. } => last.http_status(),
            _ => None,
        }
    }

    /// Check if the provider signalled a rate limit.
    ///
    /// Matches the 429 status code as well as error messages that only carry
    /// the code or the `RESOURCE_EXHAUSTED` status text.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GeminiError::RateLimited { .. } => true,
            GeminiError::MaxRetriesExceeded { .. } => false,
            GeminiError::Config(_) => false,
            other => {
                if other.http_status() == Some(429) {
                    return true;
                }
                let msg = other.to_string();
                msg.contains("429") || msg.contains("RESOURCE_EXHAUSTED")
            }
        }
    }

    /// True once retries have been used up.
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, GeminiError::MaxRetriesExceeded { .. })
    }
}
