//! In-memory provider for tests.
//!
//! Enabled for this crate's unit tests and, through the `testing` feature,
//! for downstream crates that need a gateway without network access.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::GatewayConfig;
use crate::error::{GeminiError, GeminiResult};
use crate::gateway::GenerationGateway;
use crate::provider::Provider;
use crate::retry::RetryConfig;
use crate::types::{Candidate, Content, GenerateContentRequest, GenerateContentResponse, Part};

/// A request as seen by [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub request: GenerateContentRequest,
}

impl RecordedCall {
    /// All text parts joined with newlines.
    pub fn prompt(&self) -> String {
        self.request
            .parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of inline binary parts attached.
    pub fn inline_count(&self) -> usize {
        self.request.parts().filter(|p| p.inline_data.is_some()).count()
    }
}

type Responder = Box<dyn Fn(&RecordedCall) -> GeminiResult<GenerateContentResponse> + Send + Sync>;

/// Provider answering from a closure and recording every call.
pub struct ScriptedProvider {
    responder: Responder,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Duration,
}

impl ScriptedProvider {
    /// Answer every call with `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&RecordedCall) -> GeminiResult<GenerateContentResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// Hold every call for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answer calls with `responses` in order, failing once they run out.
    pub fn sequence(responses: Vec<GeminiResult<GenerateContentResponse>>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GeminiError::invalid_response("scripted responses exhausted")))
        })
    }

    /// Answer every call with the result of `f`.
    pub fn always<F>(f: F) -> Self
    where
        F: Fn() -> GeminiResult<GenerateContentResponse> + Send + Sync + 'static,
    {
        Self::new(move |_| f())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let call = RecordedCall {
            model: model.to_string(),
            request: request.clone(),
        };
        let result = (self.responder)(&call);
        self.calls.lock().unwrap().push(call);
        result
    }
}

/// Retry policy with millisecond delays and no jitter.
pub fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .with_base_delay(Duration::from_millis(1))
        .with_jitter(Duration::ZERO)
}

/// Gateway over `provider` with [`fast_retry`].
pub fn gateway_with(provider: ScriptedProvider) -> GenerationGateway<ScriptedProvider> {
    let config = GatewayConfig::default()
        .with_api_key("test-key")
        .with_retry(fast_retry());
    GenerationGateway::new(provider, config).expect("test gateway")
}

fn response_with(parts: Vec<Part>) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(Content { role: None, parts }),
        }],
    }
}

/// A response carrying one text part.
pub fn text_response(text: &str) -> GenerateContentResponse {
    response_with(vec![Part::text(text)])
}

/// A response carrying one inline image part.
pub fn image_response(mime_type: &str, data: &str) -> GenerateContentResponse {
    response_with(vec![Part::inline(mime_type, data)])
}

/// A response carrying base64 PCM audio.
pub fn audio_response(data: &str) -> GenerateContentResponse {
    response_with(vec![Part::inline("audio/L16;codec=pcm;rate=24000", data)])
}

/// A successful response with no candidates.
pub fn empty_response() -> GenerateContentResponse {
    GenerateContentResponse::default()
}
