//! Studio configuration.

use cine_gemini::GatewayConfig;
use cine_media::EngineConfig;

use crate::error::{StudioError, StudioResult};
use crate::policy::GenerationPolicy;

/// Studio configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Scheduling of frame image generation during storyboard builds.
    pub frame_policy: GenerationPolicy,
    /// Scheduling of asset plates after manuscript import.
    pub plate_policy: GenerationPolicy,
    pub gateway: GatewayConfig,
    pub engine: EngineConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            frame_policy: GenerationPolicy::Sequential,
            plate_policy: GenerationPolicy::Concurrent,
            gateway: GatewayConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl StudioConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StudioResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            frame_policy: policy_from_env("CINE_FRAME_POLICY", defaults.frame_policy)?,
            plate_policy: policy_from_env("CINE_PLATE_POLICY", defaults.plate_policy)?,
            gateway: GatewayConfig::from_env()?,
            engine: EngineConfig::from_env(),
        })
    }

    pub fn with_frame_policy(mut self, policy: GenerationPolicy) -> Self {
        self.frame_policy = policy;
        self
    }

    pub fn with_plate_policy(mut self, policy: GenerationPolicy) -> Self {
        self.plate_policy = policy;
        self
    }
}

fn policy_from_env(key: &str, default: GenerationPolicy) -> StudioResult<GenerationPolicy> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e| StudioError::config_error(format!("{key}: {e}"))),
        Err(_) => Ok(default),
    }
}
