//! Generation gateway for the Gemini multimodal API.
//!
//! This crate provides:
//! - A rate-limit-aware retry orchestrator with exponential backoff and jitter
//! - A lenient JSON normalizer for loosely formatted model output
//! - The `Provider` seam and its Gemini REST implementation
//! - Gateway operations: manuscript analysis, scene partitioning, frame image
//!   synthesis, asset plate synthesis and emotional speech synthesis

pub mod analysis;
pub mod config;
pub mod error;
pub mod gateway;
pub mod imaging;
pub mod metrics;
pub mod normalize;
pub mod partition;
pub mod prompts;
pub mod provider;
pub mod retry;
pub mod speech;
pub mod types;
pub mod voice;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use analysis::{CharacterDraft, EnvironmentDraft, ManuscriptAnalysis, MotifDraft};
pub use config::GatewayConfig;
pub use error::{GeminiError, GeminiResult};
pub use gateway::GenerationGateway;
pub use imaging::{EditPoint, FrameImageRequest, ShotReferences};
pub use normalize::{normalize_json, parse_structured};
pub use partition::script_coverage_matches;
pub use provider::{GeminiHttpProvider, Provider};
pub use retry::{with_retry, RetryConfig, RetrySignal};
pub use voice::VoicePersona;
