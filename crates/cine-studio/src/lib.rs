//! Storyboard studio.
//!
//! This crate provides:
//! - A single-writer scene store fed by update messages
//! - Sequential and concurrent generation policies
//! - The user workflows: manuscript import, storyboard build, paint-to-edit,
//!   frame audio and export
//! - Configuration and tracing bootstrap for the `cineboard` binary

pub mod config;
pub mod error;
pub mod logging;
pub mod policy;
pub mod store;
pub mod studio;

pub use config::StudioConfig;
pub use error::{StudioError, StudioResult};
pub use logging::{init_tracing, LogFormat};
pub use policy::{run_with_policy, GenerationPolicy};
pub use store::{reduce, SceneStore, SceneUpdate, UpdateOutcome};
pub use studio::{
    AssetRef, ImportSummary, PendingAsset, StoryboardSummary, Studio, DEFAULT_PERFORMANCE_BRIEF,
};
