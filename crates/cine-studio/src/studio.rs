//! Storyboard workflows over the scene store.

use std::future::Future;
use std::sync::Arc;

use cine_codec::{pcm16_duration_seconds, PCM_SAMPLE_RATE};
use cine_gemini::{
    EditPoint, FrameImageRequest, GeminiHttpProvider, GenerationGateway, Provider,
    ShotReferences,
};
use cine_media::{EngineLoader, ExportProgress, ExportedVideo, SharedFfmpegLoader, VideoExporter};
use cine_models::{
    AssetKind, Character, CharacterId, Environment, EnvironmentId, Frame, FrameId, Genre,
    ImageSource, Manifest, Motif, MotifId, SceneState,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::policy::run_with_policy;
use crate::store::{SceneStore, SceneUpdate, UpdateOutcome};

/// Performance brief used when a frame has no emotional arc.
pub const DEFAULT_PERFORMANCE_BRIEF: &str = "Cinematic Performance";

/// Manifest entry awaiting its plate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    Character(CharacterId),
    Environment(EnvironmentId),
}

impl AssetRef {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetRef::Character(_) => AssetKind::Character,
            AssetRef::Environment(_) => AssetKind::Environment,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AssetRef::Character(id) => id.as_str(),
            AssetRef::Environment(id) => id.as_str(),
        }
    }

    fn image_update(&self, image: ImageSource) -> SceneUpdate {
        match self {
            AssetRef::Character(id) => SceneUpdate::SetCharacterImage {
                id: id.clone(),
                image,
            },
            AssetRef::Environment(id) => SceneUpdate::SetEnvironmentImage {
                id: id.clone(),
                image,
            },
        }
    }

    fn removal(&self) -> SceneUpdate {
        match self {
            AssetRef::Character(id) => SceneUpdate::RemoveCharacter(id.clone()),
            AssetRef::Environment(id) => SceneUpdate::RemoveEnvironment(id.clone()),
        }
    }
}

/// An optimistically inserted manifest entry and its plate generation.
///
/// The entry is in the scene as soon as this handle exists. If the plate
/// fails or comes back empty the entry is removed again.
#[derive(Debug)]
pub struct PendingAsset {
    pub asset: AssetRef,
    task: JoinHandle<bool>,
}

impl PendingAsset {
    pub fn id(&self) -> &str {
        self.asset.as_str()
    }

    /// Wait for the plate. True if it landed, false if the entry was rolled back.
    pub async fn settled(self) -> bool {
        self.task.await.unwrap_or(false)
    }
}

/// Result of a manuscript import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub characters: usize,
    pub environments: usize,
    pub motifs: usize,
    pub plates_resolved: usize,
    /// Entries removed because their plate failed.
    pub plates_failed: usize,
}

/// Result of a storyboard build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoryboardSummary {
    pub frames: usize,
    pub images_resolved: usize,
}

/// The storyboard studio: one scene document plus the services that fill it.
pub struct Studio<P: Provider = GeminiHttpProvider, L: EngineLoader = SharedFfmpegLoader> {
    gateway: Arc<GenerationGateway<P>>,
    exporter: VideoExporter<L>,
    store: SceneStore,
    config: StudioConfig,
}

impl Studio {
    /// Studio over the Gemini REST API and the shared FFmpeg engine.
    pub fn from_config(config: StudioConfig, scene: SceneState) -> StudioResult<Self> {
        let gateway = GenerationGateway::from_config(config.gateway.clone())?;
        let exporter = VideoExporter::ffmpeg(config.engine.clone());
        Ok(Self::new(gateway, exporter, config, scene))
    }
}

impl<P, L> Studio<P, L>
where
    P: Provider + 'static,
    L: EngineLoader,
{
    /// Spawns the scene store, so must be called inside a Tokio runtime.
    pub fn new(
        gateway: GenerationGateway<P>,
        exporter: VideoExporter<L>,
        config: StudioConfig,
        scene: SceneState,
    ) -> Self {
        Self {
            gateway: Arc::new(gateway),
            exporter,
            store: SceneStore::spawn(scene),
            config,
        }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn gateway(&self) -> &GenerationGateway<P> {
        &self.gateway
    }

    /// A copy of the scene document.
    pub async fn snapshot(&self) -> StudioResult<SceneState> {
        self.store.snapshot().await
    }

    /// Replace the scene's title, location and genre.
    pub async fn set_details(
        &self,
        title: impl Into<String>,
        location: impl Into<String>,
        genre: Genre,
    ) -> StudioResult<()> {
        self.store
            .apply(SceneUpdate::SetDetails {
                title: title.into(),
                location: location.into(),
                genre,
            })
            .await?;
        Ok(())
    }

    /// Analyze a manuscript and rebuild the manifest from it.
    ///
    /// On analysis failure the scene is left untouched. Otherwise the script
    /// and a fresh manifest are stored, then every character and environment
    /// gets a plate under the plate policy. Entries whose plate fails are
    /// removed.
    pub async fn import_manuscript(&self, manuscript: &str) -> StudioResult<ImportSummary> {
        let analysis = self.gateway.analyze_manuscript(manuscript).await?;

        let manifest = Manifest {
            characters: analysis
                .characters
                .into_iter()
                .map(|c| Character::pending(CharacterId::new(), c.name, c.role, c.description))
                .collect(),
            environments: analysis
                .environments
                .into_iter()
                .map(|e| Environment::pending(EnvironmentId::new(), e.name, e.mood, e.colors))
                .collect(),
            motifs: analysis
                .motifs
                .into_iter()
                .map(|m| Motif {
                    id: MotifId::new(),
                    label: m.label,
                    icon: m.icon,
                    description: m.description,
                    frequency: m.frequency,
                })
                .collect(),
        };

        let mut summary = ImportSummary {
            characters: manifest.characters.len(),
            environments: manifest.environments.len(),
            motifs: manifest.motifs.len(),
            ..Default::default()
        };

        let mut plates = Vec::new();
        for character in &manifest.characters {
            plates.push((
                AssetRef::Character(character.id.clone()),
                character.name.clone(),
                character.description.clone(),
            ));
        }
        for environment in &manifest.environments {
            plates.push((
                AssetRef::Environment(environment.id.clone()),
                environment.name.clone(),
                environment.mood.clone(),
            ));
        }

        self.store
            .apply(SceneUpdate::SetScript(manuscript.to_string()))
            .await?;
        self.store.apply(SceneUpdate::ReplaceManifest(manifest)).await?;

        info!(
            characters = summary.characters,
            environments = summary.environments,
            motifs = summary.motifs,
            policy = %self.config.plate_policy,
            "Manuscript imported, generating plates"
        );

        let jobs = plates
            .into_iter()
            .map(|(asset, name, description)| {
                resolve_plate(
                    self.gateway.clone(),
                    self.store.clone(),
                    asset,
                    name,
                    description,
                )
            })
            .collect();
        let results = run_with_policy(self.config.plate_policy, jobs).await;

        summary.plates_resolved = results.iter().filter(|landed| **landed).count();
        summary.plates_failed = results.len() - summary.plates_resolved;
        Ok(summary)
    }

    /// Add a character and generate its plate in the background.
    pub async fn add_character(
        &self,
        name: impl Into<String>,
        role: impl Into<String>,
        description: impl Into<String>,
    ) -> StudioResult<PendingAsset> {
        let character = Character::pending(CharacterId::new(), name, role, description);
        let asset = AssetRef::Character(character.id.clone());
        let (name, description) = (character.name.clone(), character.description.clone());

        self.store.apply(SceneUpdate::InsertCharacter(character)).await?;
        Ok(self.spawn_plate(asset, name, description))
    }

    /// Add an environment and generate its plate in the background.
    pub async fn add_environment(
        &self,
        name: impl Into<String>,
        mood: impl Into<String>,
        colors: Vec<String>,
    ) -> StudioResult<PendingAsset> {
        let environment = Environment::pending(EnvironmentId::new(), name, mood, colors);
        let asset = AssetRef::Environment(environment.id.clone());
        let (name, mood) = (environment.name.clone(), environment.mood.clone());

        self.store
            .apply(SceneUpdate::InsertEnvironment(environment))
            .await?;
        Ok(self.spawn_plate(asset, name, mood))
    }

    fn spawn_plate(&self, asset: AssetRef, name: String, description: String) -> PendingAsset {
        let task = tokio::spawn(resolve_plate(
            self.gateway.clone(),
            self.store.clone(),
            asset.clone(),
            name,
            description,
        ));
        PendingAsset { asset, task }
    }

    /// Partition the script into frames and generate each frame's image.
    ///
    /// Existing frames are replaced only once partitioning yields at least
    /// one frame. Every new frame starts generating and is settled whether or
    /// not its image call succeeds, even if the caller stops waiting.
    pub async fn build_storyboard(&self) -> StudioResult<StoryboardSummary> {
        let scene = self.store.snapshot().await?;
        if scene.script.trim().is_empty() {
            return Err(StudioError::EmptyScript);
        }

        let drafts = self
            .gateway
            .partition_scene(&scene.script, &scene.manifest, scene.genre)
            .await?;
        if drafts.is_empty() {
            warn!(
                existing = scene.frames.len(),
                "Partitioning produced no frames, keeping current storyboard"
            );
            return Ok(StoryboardSummary::default());
        }

        let frames: Vec<Frame> = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| Frame::from_draft(FrameId::new(), index, draft))
            .collect();
        let requests: Vec<(FrameId, FrameImageRequest)> = frames
            .iter()
            .map(|frame| {
                let request = FrameImageRequest::new(frame.prompt.clone())
                    .with_references(shot_references(frame));
                (frame.id.clone(), request)
            })
            .collect();

        let gateway = self.gateway.clone();
        let store = self.store.clone();
        let policy = self.config.frame_policy;
        let manifest = Arc::new(scene.manifest);
        detached(async move {
            let count = frames.len();
            store.apply(SceneUpdate::ReplaceFrames(frames)).await?;
            info!(frames = count, %policy, "Storyboard partitioned, generating frames");

            let jobs = requests
                .into_iter()
                .map(|(id, request)| {
                    render_frame(gateway.clone(), store.clone(), manifest.clone(), id, request)
                })
                .collect();
            let results = run_with_policy(policy, jobs).await;

            Ok(StoryboardSummary {
                frames: count,
                images_resolved: results.iter().filter(|resolved| **resolved).count(),
            })
        })
        .await
    }

    /// Paint-to-edit: adjust a frame's image by instruction, optionally at a point.
    ///
    /// Returns true if a new image replaced the old one. An empty response
    /// keeps the prior image. Provider errors are returned after the frame
    /// has been settled.
    pub async fn refine_frame(
        &self,
        id: &FrameId,
        instruction: &str,
        point: Option<EditPoint>,
    ) -> StudioResult<bool> {
        let gateway = self.gateway.clone();
        let store = self.store.clone();
        let id = id.clone();
        let instruction = instruction.to_string();
        detached(async move {
            begin_generation(&store, SceneUpdate::BeginFrameImage(id.clone()), &id).await?;

            let result = generate_refinement(&gateway, &store, &id, &instruction, point).await;
            let image = match &result {
                Ok(Some(uri)) => Some(ImageSource::Inline(uri.clone())),
                _ => None,
            };
            let replaced = image.is_some();
            settle_frame_image(&store, id.clone(), image).await;

            result?;
            info!(frame_id = %id, replaced, "Frame refined");
            Ok(replaced)
        })
        .await
    }

    /// Perform a frame's script segment and store the audio on the frame.
    ///
    /// Returns true if new audio was stored. Speech failures keep the prior
    /// audio and return false.
    pub async fn synthesize_frame_audio(&self, id: &FrameId) -> StudioResult<bool> {
        let scene = self.store.snapshot().await?;
        let frame = scene
            .frame(id)
            .ok_or_else(|| StudioError::FrameNotFound(id.clone()))?;
        let segment = frame
            .script_segment
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| StudioError::MissingScriptSegment(id.clone()))?;
        let brief = frame
            .emotion()
            .unwrap_or(DEFAULT_PERFORMANCE_BRIEF)
            .to_string();
        let genre = scene.genre;

        let gateway = self.gateway.clone();
        let store = self.store.clone();
        let id = id.clone();
        detached(async move {
            begin_generation(&store, SceneUpdate::BeginFrameAudio(id.clone()), &id).await?;

            let audio = gateway.synthesize_performance(&segment, &brief, genre).await;
            if let Some(data) = &audio {
                info!(
                    frame_id = %id,
                    duration_secs = pcm16_duration_seconds(data, PCM_SAMPLE_RATE),
                    "Frame audio synthesized"
                );
            }

            let stored = audio.is_some();
            store
                .apply(SceneUpdate::FinishFrameAudio {
                    id: id.clone(),
                    audio,
                })
                .await?;
            Ok(stored)
        })
        .await
    }

    /// Synthesize audio for every frame with a script segment, in frame order.
    ///
    /// Returns the number of frames that received audio.
    pub async fn synthesize_storyboard_audio(&self) -> StudioResult<usize> {
        let scene = self.store.snapshot().await?;
        let mut stored = 0;
        for frame in &scene.frames {
            match self.synthesize_frame_audio(&frame.id).await {
                Ok(true) => stored += 1,
                Ok(false) => {}
                Err(StudioError::MissingScriptSegment(id)) => {
                    warn!(frame_id = %id, "Skipping audio for frame without script segment");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(stored)
    }

    /// Export the current frames as one video.
    ///
    /// Exports against the same engine run one at a time.
    pub async fn export(
        &self,
        on_progress: &(dyn Fn(ExportProgress) + Send + Sync),
    ) -> StudioResult<ExportedVideo> {
        let scene = self.store.snapshot().await?;
        Ok(self
            .exporter
            .export(&scene.title, &scene.frames, on_progress)
            .await?)
    }
}

/// Run `task` on its own Tokio task so it completes even if the caller
/// stops waiting. Frames flagged as generating always get settled this way.
async fn detached<T, F>(task: F) -> StudioResult<T>
where
    T: Send + 'static,
    F: Future<Output = StudioResult<T>> + Send + 'static,
{
    tokio::spawn(task).await?
}

/// Apply a begin-generation update, mapping a rejection to its error.
async fn begin_generation(store: &SceneStore, update: SceneUpdate, id: &FrameId) -> StudioResult<()> {
    match store.apply(update).await? {
        UpdateOutcome::Applied => Ok(()),
        UpdateOutcome::Busy => Err(StudioError::FrameBusy(id.clone())),
        UpdateOutcome::Missing => Err(StudioError::FrameNotFound(id.clone())),
    }
}

/// Generate one storyboard frame's image and settle the frame.
async fn render_frame<P: Provider>(
    gateway: Arc<GenerationGateway<P>>,
    store: SceneStore,
    manifest: Arc<Manifest>,
    id: FrameId,
    request: FrameImageRequest,
) -> bool {
    let image = match gateway.synthesize_frame_image(&manifest, &request).await {
        Ok(Some(uri)) => Some(ImageSource::Inline(uri)),
        Ok(None) => {
            warn!(frame_id = %id, "Frame image came back empty");
            None
        }
        Err(e) => {
            warn!(frame_id = %id, "Frame image failed: {}", e);
            None
        }
    };
    let resolved = image.is_some();
    settle_frame_image(&store, id, image).await;
    resolved
}

async fn generate_refinement<P: Provider>(
    gateway: &GenerationGateway<P>,
    store: &SceneStore,
    id: &FrameId,
    instruction: &str,
    point: Option<EditPoint>,
) -> StudioResult<Option<String>> {
    let scene = store.snapshot().await?;
    let frame = scene
        .frame(id)
        .ok_or_else(|| StudioError::FrameNotFound(id.clone()))?;

    let mut request = FrameImageRequest::new(instruction).with_references(shot_references(frame));
    if let Some(base) = frame.image.as_url() {
        request = request.editing(base, point);
    }

    Ok(gateway
        .synthesize_frame_image(&scene.manifest, &request)
        .await?)
}

async fn settle_frame_image(store: &SceneStore, id: FrameId, image: Option<ImageSource>) {
    let update = SceneUpdate::FinishFrameImage {
        id: id.clone(),
        image,
    };
    if let Err(e) = store.apply(update).await {
        warn!(frame_id = %id, "Could not settle frame image: {}", e);
    }
}

fn shot_references(frame: &Frame) -> ShotReferences {
    ShotReferences {
        character_id: frame.character_id.clone(),
        environment_id: frame.environment_id.clone(),
        shot_type: frame.shot_type.clone(),
        emotion: frame.emotion().map(str::to_string),
    }
}

/// Generate a plate and patch it onto its entry, or remove the entry.
async fn resolve_plate<P: Provider>(
    gateway: Arc<GenerationGateway<P>>,
    store: SceneStore,
    asset: AssetRef,
    name: String,
    description: String,
) -> bool {
    let kind = asset.kind();
    let outcome = gateway
        .synthesize_asset_plate(&name, &description, kind)
        .await;

    let update = match outcome {
        Ok(Some(uri)) => {
            info!(asset_id = asset.as_str(), %kind, "Plate generated for {}", name);
            asset.image_update(ImageSource::Inline(uri))
        }
        Ok(None) => {
            warn!(asset_id = asset.as_str(), %kind, "Plate for {} came back empty, removing", name);
            asset.removal()
        }
        Err(e) => {
            warn!(asset_id = asset.as_str(), %kind, "Plate for {} failed, removing: {}", name, e);
            asset.removal()
        }
    };
    let landed = !matches!(
        update,
        SceneUpdate::RemoveCharacter(_) | SceneUpdate::RemoveEnvironment(_)
    );

    match store.apply(update).await {
        Ok(UpdateOutcome::Applied) => landed,
        Ok(_) => false,
        Err(e) => {
            warn!(asset_id = asset.as_str(), "Scene closed before plate settled: {}", e);
            false
        }
    }
}
