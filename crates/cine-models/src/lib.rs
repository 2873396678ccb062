//! Scene document models for Cineboard.
//!
//! This crate provides Serde-serializable types for:
//! - The scene document (title, script, genre, manifest, frames)
//! - Manifest entries (characters, environments, motifs)
//! - Storyboard frames and director's briefs
//! - Image sources with an explicit pending state

pub mod frame;
pub mod genre;
pub mod ids;
pub mod image;
pub mod manifest;
pub mod scene;

// Re-export common types
pub use frame::{time_range_for_slot, DirectorsBrief, Frame, FrameDraft};
pub use genre::{Genre, ParseGenreError};
pub use ids::{CharacterId, EnvironmentId, FrameId, MotifId};
pub use image::ImageSource;
pub use manifest::{AssetKind, Character, Environment, Manifest, Motif};
pub use scene::{SceneState, SentimentSample};
