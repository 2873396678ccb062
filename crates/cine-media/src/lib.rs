//! Media assembly for storyboard export.
//!
//! This crate provides:
//! - FFmpeg command building and `-progress` parsing
//! - The `MediaEngine` seam with an FFmpeg-backed engine and a load-once cache
//! - The export pipeline turning frames into one concatenated MP4

pub mod command;
pub mod engine;
pub mod error;
pub mod export;
pub mod progress;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use command::{check_ffmpeg, concat_command, segment_command, FfmpegCommand};
pub use engine::{shared_ffmpeg_engine, EngineCache, EngineCommand, EngineConfig, FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use export::{
    export_file_name, EngineLoader, ExportProgress, ExportStage, ExportedSegment, ExportedVideo,
    ReadyEngine, SharedFfmpegLoader, VideoExporter,
};
pub use progress::FfmpegProgress;
