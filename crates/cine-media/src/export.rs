//! Storyboard export: frames to segments to one concatenated video.
//!
//! Per export the pipeline moves through
//! `Idle -> EngineLoading -> AssetStaging -> SegmentEncoding -> Concatenating
//! -> Cleanup -> Done`, or to `Failed` from any stage. Intermediate files are
//! removed from the engine whether or not the export succeeds.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use cine_codec::{decode_base64, get_image_bytes, pcm16_duration_seconds, PCM_SAMPLE_RATE};
use cine_models::{Frame, FrameId};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::command::{concat_command, concat_list, segment_command};
use crate::engine::{shared_ffmpeg_engine, EngineCommand, EngineConfig, FfmpegEngine, MediaEngine};
use crate::error::{MediaError, MediaResult};

/// Histogram of successful export wall time.
pub const EXPORT_SECONDS: &str = "cine_export_seconds";

const CONCAT_LIST: &str = "list.txt";
const OUTPUT_FILE: &str = "output.mp4";

fn image_file(index: usize) -> String {
    format!("img{index}.png")
}

fn audio_file(index: usize) -> String {
    format!("aud{index}.raw")
}

fn segment_file(index: usize) -> String {
    format!("segment-{index}.mp4")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Idle,
    EngineLoading,
    AssetStaging,
    SegmentEncoding,
    Concatenating,
    Cleanup,
    Done,
    Failed,
}

impl ExportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStage::Idle => "idle",
            ExportStage::EngineLoading => "engine_loading",
            ExportStage::AssetStaging => "asset_staging",
            ExportStage::SegmentEncoding => "segment_encoding",
            ExportStage::Concatenating => "concatenating",
            ExportStage::Cleanup => "cleanup",
            ExportStage::Done => "done",
            ExportStage::Failed => "failed",
        }
    }
}

/// Progress update delivered to the export caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportProgress {
    pub stage: ExportStage,
    /// Percent complete of the command currently running, `0..=100`.
    pub percent: u8,
}

/// One segment of an exported video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSegment {
    pub frame_id: FrameId,
    pub duration_secs: f64,
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportedVideo {
    pub bytes: Vec<u8>,
    pub file_name: String,
    /// Segments in playback order.
    pub segments: Vec<ExportedSegment>,
}

impl ExportedVideo {
    pub fn total_duration_secs(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }
}

/// Download name for a scene title: unsafe characters replaced, `.mp4` appended.
pub fn export_file_name(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if cleaned.is_empty() {
        "storyboard.mp4".to_string()
    } else {
        format!("{cleaned}.mp4")
    }
}

/// Source of a loaded engine for each export.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    type Engine: MediaEngine + 'static;

    async fn load(&self) -> MediaResult<Arc<Self::Engine>>;
}

/// Loads the process-wide FFmpeg engine.
#[derive(Debug, Clone, Default)]
pub struct SharedFfmpegLoader {
    config: EngineConfig,
}

impl SharedFfmpegLoader {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineLoader for SharedFfmpegLoader {
    type Engine = FfmpegEngine;

    async fn load(&self) -> MediaResult<Arc<FfmpegEngine>> {
        shared_ffmpeg_engine(&self.config).await
    }
}

/// Hands out an engine that is already loaded.
pub struct ReadyEngine<E>(pub Arc<E>);

#[async_trait]
impl<E: MediaEngine + 'static> EngineLoader for ReadyEngine<E> {
    type Engine = E;

    async fn load(&self) -> MediaResult<Arc<E>> {
        Ok(self.0.clone())
    }
}

/// Progress sink shared by the stages of one export.
struct Reporter<'a> {
    sink: &'a (dyn Fn(ExportProgress) + Send + Sync),
}

impl Reporter<'_> {
    fn stage(&self, stage: ExportStage) {
        info!(stage = stage.as_str(), "Export stage");
        (self.sink)(ExportProgress { stage, percent: 0 });
    }

    fn done(&self) {
        (self.sink)(ExportProgress {
            stage: ExportStage::Done,
            percent: 100,
        });
    }

    /// Run `command` with progress that never decreases while it runs.
    async fn exec<E: MediaEngine + ?Sized>(
        &self,
        engine: &E,
        stage: ExportStage,
        command: &EngineCommand,
    ) -> MediaResult<()> {
        let high_water = Mutex::new(0u8);
        let on_fraction = |fraction: f64| {
            let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
            let Ok(mut best) = high_water.lock() else {
                return;
            };
            if percent > *best {
                *best = percent;
                (self.sink)(ExportProgress { stage, percent });
            }
        };
        engine.exec(command, &on_fraction).await
    }
}

/// Video exporter over an [`EngineLoader`].
pub struct VideoExporter<L> {
    loader: L,
    http: Client,
}

impl VideoExporter<SharedFfmpegLoader> {
    /// Exporter using the process-wide FFmpeg engine.
    pub fn ffmpeg(config: EngineConfig) -> Self {
        Self::new(SharedFfmpegLoader::new(config), Client::new())
    }
}

impl<L: EngineLoader> VideoExporter<L> {
    pub fn new(loader: L, http: Client) -> Self {
        Self { loader, http }
    }

    /// Render `frames` into one video.
    ///
    /// Frames lacking an image or audio are skipped. Fails with
    /// [`MediaError::NoExportableFrames`] before touching the engine when none
    /// remain. Holds the engine's session from staging through cleanup.
    pub async fn export(
        &self,
        title: &str,
        frames: &[Frame],
        on_progress: &(dyn Fn(ExportProgress) + Send + Sync),
    ) -> MediaResult<ExportedVideo> {
        let started = Instant::now();
        let reporter = Reporter { sink: on_progress };
        reporter.stage(ExportStage::Idle);

        let eligible: Vec<&Frame> = frames.iter().filter(|f| f.is_exportable()).collect();
        if eligible.is_empty() {
            warn!(frames = frames.len(), "No frames with both image and audio");
            reporter.stage(ExportStage::Failed);
            return Err(MediaError::NoExportableFrames);
        }
        if eligible.len() < frames.len() {
            info!(
                skipped = frames.len() - eligible.len(),
                "Excluding frames missing image or audio"
            );
        }

        reporter.stage(ExportStage::EngineLoading);
        let engine = match self.loader.load().await {
            Ok(engine) => engine,
            Err(e) => {
                reporter.stage(ExportStage::Failed);
                return Err(e);
            }
        };

        let _session = engine.session().lock().await;
        let mut written = Vec::new();
        let result = self
            .assemble(engine.as_ref(), &eligible, &reporter, &mut written)
            .await;

        reporter.stage(ExportStage::Cleanup);
        cleanup(engine.as_ref(), &written).await;

        match result {
            Ok((bytes, segments)) => {
                let elapsed = started.elapsed().as_secs_f64();
                metrics::histogram!(EXPORT_SECONDS).record(elapsed);
                info!(
                    segments = segments.len(),
                    bytes = bytes.len(),
                    elapsed_secs = elapsed,
                    "Export complete"
                );
                reporter.done();
                Ok(ExportedVideo {
                    bytes,
                    file_name: export_file_name(title),
                    segments,
                })
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                reporter.stage(ExportStage::Failed);
                Err(e)
            }
        }
    }

    async fn assemble(
        &self,
        engine: &L::Engine,
        frames: &[&Frame],
        reporter: &Reporter<'_>,
        written: &mut Vec<String>,
    ) -> MediaResult<(Vec<u8>, Vec<ExportedSegment>)> {
        reporter.stage(ExportStage::AssetStaging);
        for (index, frame) in frames.iter().enumerate() {
            let image = get_image_bytes(&self.http, frame.image.as_url().unwrap_or_default()).await;
            let audio_b64 = frame.audio_data.as_deref().unwrap_or_default();
            let audio = decode_base64(audio_b64).map_err(|e| {
                MediaError::internal(format!("frame {} has undecodable audio: {}", frame.id, e))
            })?;

            let image_name = image_file(index);
            written.push(image_name.clone());
            engine.write_file(&image_name, &image).await?;

            let audio_name = audio_file(index);
            written.push(audio_name.clone());
            engine.write_file(&audio_name, &audio).await?;

            debug!(frame_id = %frame.id, index, "Staged frame assets");
        }

        reporter.stage(ExportStage::SegmentEncoding);
        let mut segments = Vec::with_capacity(frames.len());
        let mut segment_names = Vec::with_capacity(frames.len());
        for (index, frame) in frames.iter().enumerate() {
            let duration = pcm16_duration_seconds(
                frame.audio_data.as_deref().unwrap_or_default(),
                PCM_SAMPLE_RATE,
            );
            let command = segment_command(&image_file(index), &audio_file(index), &segment_file(index), duration);
            written.push(command.output().to_string());

            let command = EngineCommand::new(command.build_args(), Some(duration));
            reporter
                .exec(engine, ExportStage::SegmentEncoding, &command)
                .await?;

            segment_names.push(segment_file(index));
            segments.push(ExportedSegment {
                frame_id: frame.id.clone(),
                duration_secs: duration,
            });
        }

        reporter.stage(ExportStage::Concatenating);
        written.push(CONCAT_LIST.to_string());
        engine
            .write_file(CONCAT_LIST, concat_list(&segment_names).as_bytes())
            .await?;

        written.push(OUTPUT_FILE.to_string());
        let total: f64 = segments.iter().map(|s| s.duration_secs).sum();
        let command = EngineCommand::new(concat_command(CONCAT_LIST, OUTPUT_FILE).build_args(), Some(total));
        reporter
            .exec(engine, ExportStage::Concatenating, &command)
            .await?;

        let bytes = engine.read_file(OUTPUT_FILE).await?;
        Ok((bytes, segments))
    }
}

/// Delete intermediate files; failures are logged, never raised.
async fn cleanup<E: MediaEngine + ?Sized>(engine: &E, names: &[String]) {
    for name in names {
        match engine.delete_file(name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!(file = %name, "Nothing to clean up"),
            Err(e) => warn!(file = %name, "FS cleanup warning: {}", e),
        }
    }
}
