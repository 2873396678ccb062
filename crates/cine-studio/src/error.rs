//! Studio error types.

use cine_models::FrameId;
use thiserror::Error;

pub type StudioResult<T> = Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Frame not found: {0}")]
    FrameNotFound(FrameId),

    #[error("Frame {0} is already generating")]
    FrameBusy(FrameId),

    #[error("Frame {0} has no script segment to perform")]
    MissingScriptSegment(FrameId),

    #[error("Scene has no script; import a manuscript first")]
    EmptyScript,

    #[error("Scene store is closed")]
    StoreClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Gemini(#[from] cine_gemini::GeminiError),

    #[error("Media error: {0}")]
    Media(#[from] cine_media::MediaError),

    #[error("Background generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StudioError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
