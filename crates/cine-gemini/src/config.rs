//! Gateway configuration.

use std::time::Duration;

use crate::error::{GeminiError, GeminiResult};
use crate::retry::RetryConfig;

/// Public Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the generation gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API key sent with every request
    pub api_key: String,
    /// Base URL of the REST API (overridable for tests and proxies)
    pub base_url: String,
    /// Model used for manuscript analysis and scene partitioning
    pub text_model: String,
    /// Model used for frame images and asset plates
    pub image_model: String,
    /// Model used for speech synthesis
    pub tts_model: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Rate-limit retry policy
    pub retry: RetryConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: "gemini-3-pro-preview".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            timeout: Duration::from_secs(120),
            retry: RetryConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Create config from environment variables. `GEMINI_API_KEY` is required.
    pub fn from_env() -> GeminiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GeminiError::config_error("GEMINI_API_KEY not set"))?;

        let defaults = Self::default();
        Ok(Self {
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            text_model: std::env::var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: std::env::var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            tts_model: std::env::var("GEMINI_TTS_MODEL").unwrap_or(defaults.tts_model),
            timeout: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retry: RetryConfig::from_env(),
        })
    }

    /// Config pointing at an explicit endpoint, mostly for tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.image_model, "gemini-2.5-flash-image");
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_builders() {
        let config = GatewayConfig::default()
            .with_api_key("k")
            .with_base_url("http://127.0.0.1:9")
            .with_retry(RetryConfig::default().with_max_attempts(2));
        assert_eq!(config.api_key, "k");
        assert_eq!(config.base_url, "http://127.0.0.1:9");
        assert_eq!(config.retry.max_attempts, 2);
    }
}
