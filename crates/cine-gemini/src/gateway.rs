//! Generation gateway: one entry point per generative task.
//!
//! The operations themselves live next to their prompt handling in
//! [`crate::analysis`], [`crate::partition`], [`crate::imaging`] and
//! [`crate::speech`]; this module holds the shared plumbing.

use reqwest::Client;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::{GeminiError, GeminiResult};
use crate::provider::{GeminiHttpProvider, Provider};
use crate::retry::with_retry;
use crate::types::{GenerateContentRequest, GenerateContentResponse};

/// Gateway over a [`Provider`].
pub struct GenerationGateway<P: Provider = GeminiHttpProvider> {
    pub(crate) provider: P,
    pub(crate) config: GatewayConfig,
    /// Used to fetch remote reference images.
    pub(crate) http: Client,
}

impl GenerationGateway<GeminiHttpProvider> {
    /// Create a gateway backed by the Gemini REST API.
    pub fn from_config(config: GatewayConfig) -> GeminiResult<Self> {
        let provider = GeminiHttpProvider::new(&config.base_url, &config.api_key, config.timeout)?;
        Self::new(provider, config)
    }

    /// Create from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        Self::from_config(GatewayConfig::from_env()?)
    }
}

impl<P: Provider> GenerationGateway<P> {
    pub fn new(provider: P, config: GatewayConfig) -> GeminiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GeminiError::Network)?;

        Ok(Self {
            provider,
            config,
            http,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Issue one request, retrying rate limits under `operation`.
    pub(crate) async fn call(
        &self,
        operation: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        debug!(operation = %operation, model = %model, "Calling provider");
        with_retry(&self.config.retry, operation, || {
            self.provider.generate_content(model, request)
        })
        .await
    }
}
