//! The provider seam and its Gemini REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{GeminiError, GeminiResult};
use crate::metrics::record_request;
use crate::types::{GenerateContentRequest, GenerateContentResponse};

/// A multimodal generation backend.
///
/// Implementations report rate limiting as an error for which
/// [`GeminiError::is_rate_limited`] is true; retrying is the caller's job.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse>;
}

/// Provider talking to the Gemini REST API.
pub struct GeminiHttpProvider {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiHttpProvider {
    /// Create a new provider.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> GeminiResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GeminiError::Network)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl Provider for GeminiHttpProvider {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = self.endpoint(model);
        debug!(model = %model, "Sending generateContent request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        record_request(model, status.as_u16());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::from_http_status(status.as_u16(), body));
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        Ok(parsed)
    }
}
