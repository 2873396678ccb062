//! Single-writer scene store.
//!
//! The scene document is owned by one task. Every mutation is a
//! [`SceneUpdate`] message applied in arrival order by the pure [`reduce`]
//! function, so concurrent generation completions patch their own entity by
//! id without observing each other's intermediate state.

use cine_models::{
    Character, CharacterId, Environment, EnvironmentId, Frame, FrameId, Genre, ImageSource,
    Manifest, SceneState,
};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{StudioError, StudioResult};

const CHANNEL_CAPACITY: usize = 256;

/// A mutation of the scene document.
#[derive(Debug, Clone)]
pub enum SceneUpdate {
    SetDetails {
        title: String,
        location: String,
        genre: Genre,
    },
    SetScript(String),
    /// Replace characters, environments and motifs wholesale.
    ReplaceManifest(Manifest),
    InsertCharacter(Character),
    InsertEnvironment(Environment),
    SetCharacterImage {
        id: CharacterId,
        image: ImageSource,
    },
    SetEnvironmentImage {
        id: EnvironmentId,
        image: ImageSource,
    },
    RemoveCharacter(CharacterId),
    RemoveEnvironment(EnvironmentId),
    ReplaceFrames(Vec<Frame>),
    /// Mark a frame's image as generating. Rejected if it already is.
    BeginFrameImage(FrameId),
    /// Settle a frame's image generation. `None` keeps the prior image.
    FinishFrameImage {
        id: FrameId,
        image: Option<ImageSource>,
    },
    /// Mark a frame's audio as generating. Rejected if it already is.
    BeginFrameAudio(FrameId),
    /// Settle a frame's audio generation. `None` keeps the prior audio.
    FinishFrameAudio {
        id: FrameId,
        audio: Option<String>,
    },
}

/// What applying an update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The target id is not in the document; nothing changed.
    Missing,
    /// The target is mid-generation; nothing changed.
    Busy,
}

fn applied_if(found: bool) -> UpdateOutcome {
    if found {
        UpdateOutcome::Applied
    } else {
        UpdateOutcome::Missing
    }
}

/// Apply one update to the scene document.
pub fn reduce(state: &mut SceneState, update: SceneUpdate) -> UpdateOutcome {
    match update {
        SceneUpdate::SetDetails {
            title,
            location,
            genre,
        } => {
            state.title = title;
            state.location = location;
            state.genre = genre;
            UpdateOutcome::Applied
        }
        SceneUpdate::SetScript(script) => {
            state.script = script;
            UpdateOutcome::Applied
        }
        SceneUpdate::ReplaceManifest(manifest) => {
            state.manifest = manifest;
            UpdateOutcome::Applied
        }
        SceneUpdate::InsertCharacter(character) => {
            state.manifest.characters.push(character);
            UpdateOutcome::Applied
        }
        SceneUpdate::InsertEnvironment(environment) => {
            state.manifest.environments.push(environment);
            UpdateOutcome::Applied
        }
        SceneUpdate::SetCharacterImage { id, image } => {
            let character = state.manifest.character_mut(&id);
            let found = character.is_some();
            if let Some(character) = character {
                character.image = image;
            }
            applied_if(found)
        }
        SceneUpdate::SetEnvironmentImage { id, image } => {
            let environment = state.manifest.environment_mut(&id);
            let found = environment.is_some();
            if let Some(environment) = environment {
                environment.image = image;
            }
            applied_if(found)
        }
        SceneUpdate::RemoveCharacter(id) => {
            let before = state.manifest.characters.len();
            state.manifest.characters.retain(|c| c.id != id);
            applied_if(state.manifest.characters.len() < before)
        }
        SceneUpdate::RemoveEnvironment(id) => {
            let before = state.manifest.environments.len();
            state.manifest.environments.retain(|e| e.id != id);
            applied_if(state.manifest.environments.len() < before)
        }
        SceneUpdate::ReplaceFrames(frames) => {
            state.frames = frames;
            UpdateOutcome::Applied
        }
        SceneUpdate::BeginFrameImage(id) => match state.frame_mut(&id) {
            None => UpdateOutcome::Missing,
            Some(frame) if frame.is_generating => UpdateOutcome::Busy,
            Some(frame) => {
                frame.is_generating = true;
                UpdateOutcome::Applied
            }
        },
        SceneUpdate::FinishFrameImage { id, image } => match state.frame_mut(&id) {
            None => UpdateOutcome::Missing,
            Some(frame) => {
                if let Some(image) = image {
                    frame.image = image;
                }
                frame.is_generating = false;
                UpdateOutcome::Applied
            }
        },
        SceneUpdate::BeginFrameAudio(id) => match state.frame_mut(&id) {
            None => UpdateOutcome::Missing,
            Some(frame) if frame.is_generating_audio => UpdateOutcome::Busy,
            Some(frame) => {
                frame.is_generating_audio = true;
                UpdateOutcome::Applied
            }
        },
        SceneUpdate::FinishFrameAudio { id, audio } => match state.frame_mut(&id) {
            None => UpdateOutcome::Missing,
            Some(frame) => {
                if audio.is_some() {
                    frame.audio_data = audio;
                }
                frame.is_generating_audio = false;
                UpdateOutcome::Applied
            }
        },
    }
}

enum StoreMessage {
    Apply {
        update: SceneUpdate,
        reply: oneshot::Sender<UpdateOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<SceneState>,
    },
}

/// Cloneable handle to the task owning the scene document.
///
/// The task stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SceneStore {
    tx: mpsc::Sender<StoreMessage>,
}

impl SceneStore {
    /// Spawn the owning task with `initial` as the document.
    pub fn spawn(initial: SceneState) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(run_store(initial, rx));
        Self { tx }
    }

    /// Apply an update and wait for its outcome.
    pub async fn apply(&self, update: SceneUpdate) -> StudioResult<UpdateOutcome> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreMessage::Apply { update, reply })
            .await
            .map_err(|_| StudioError::StoreClosed)?;
        rx.await.map_err(|_| StudioError::StoreClosed)
    }

    /// A copy of the current document.
    pub async fn snapshot(&self) -> StudioResult<SceneState> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreMessage::Snapshot { reply })
            .await
            .map_err(|_| StudioError::StoreClosed)?;
        rx.await.map_err(|_| StudioError::StoreClosed)
    }
}

async fn run_store(mut state: SceneState, mut rx: mpsc::Receiver<StoreMessage>) {
    while let Some(message) = rx.recv().await {
        match message {
            StoreMessage::Apply { update, reply } => {
                let outcome = reduce(&mut state, update);
                if outcome != UpdateOutcome::Applied {
                    debug!(?outcome, "Scene update had no effect");
                }
                let _ = reply.send(outcome);
            }
            StoreMessage::Snapshot { reply } => {
                let _ = reply.send(state.clone());
            }
        }
    }
    debug!("Scene store stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use cine_models::{CharacterId, FrameId};

    fn scene_with_frame(id: &str) -> SceneState {
        let mut scene = SceneState::new("Pilot", "Hangar", Genre::Drama);
        scene
            .frames
            .push(Frame::new(FrameId::from_string(id), "Open", "wide hangar"));
        scene
    }

    #[test]
    fn test_unknown_ids_are_a_no_op() {
        let mut scene = scene_with_frame("f-1");
        let before = scene.clone();

        let outcome = reduce(
            &mut scene,
            SceneUpdate::SetCharacterImage {
                id: CharacterId::from_string("ghost"),
                image: ImageSource::Remote("https://example.com/a.png".into()),
            },
        );
        assert_eq!(outcome, UpdateOutcome::Missing);

        let outcome = reduce(
            &mut scene,
            SceneUpdate::FinishFrameImage {
                id: FrameId::from_string("f-9"),
                image: None,
            },
        );
        assert_eq!(outcome, UpdateOutcome::Missing);
        assert_eq!(scene, before);
    }

    #[test]
    fn test_begin_frame_image_rejects_busy_frame() {
        let mut scene = scene_with_frame("f-1");
        let id = FrameId::from_string("f-1");

        assert_eq!(
            reduce(&mut scene, SceneUpdate::BeginFrameImage(id.clone())),
            UpdateOutcome::Applied
        );
        assert_eq!(
            reduce(&mut scene, SceneUpdate::BeginFrameImage(id.clone())),
            UpdateOutcome::Busy
        );

        reduce(
            &mut scene,
            SceneUpdate::FinishFrameImage {
                id: id.clone(),
                image: None,
            },
        );
        let frame = scene.frame(&id).unwrap();
        assert!(!frame.is_generating);
        assert_eq!(frame.image, ImageSource::Pending);
    }

    #[test]
    fn test_finish_audio_without_result_keeps_prior_audio() {
        let mut scene = scene_with_frame("f-1");
        let id = FrameId::from_string("f-1");
        scene.frame_mut(&id).unwrap().audio_data = Some("AAAA".into());

        reduce(&mut scene, SceneUpdate::BeginFrameAudio(id.clone()));
        reduce(
            &mut scene,
            SceneUpdate::FinishFrameAudio {
                id: id.clone(),
                audio: None,
            },
        );

        let frame = scene.frame(&id).unwrap();
        assert_eq!(frame.audio_data.as_deref(), Some("AAAA"));
        assert!(!frame.is_generating_audio);
    }

    #[test]
    fn test_remove_character() {
        let mut scene = scene_with_frame("f-1");
        let id = CharacterId::from_string("c-1");
        reduce(
            &mut scene,
            SceneUpdate::InsertCharacter(Character::pending(id.clone(), "Mara", "Lead", "pilot")),
        );
        assert!(scene.manifest.character(&id).is_some());

        assert_eq!(
            reduce(&mut scene, SceneUpdate::RemoveCharacter(id.clone())),
            UpdateOutcome::Applied
        );
        assert!(scene.manifest.character(&id).is_none());
        assert_eq!(
            reduce(&mut scene, SceneUpdate::RemoveCharacter(id)),
            UpdateOutcome::Missing
        );
    }

    #[tokio::test]
    async fn test_store_applies_in_order() {
        let store = SceneStore::spawn(SceneState::new("Pilot", "Hangar", Genre::Drama));

        store
            .apply(SceneUpdate::SetScript("first".into()))
            .await
            .unwrap();
        store
            .apply(SceneUpdate::SetScript("second".into()))
            .await
            .unwrap();

        let scene = store.snapshot().await.unwrap();
        assert_eq!(scene.script, "second");
        assert_eq!(scene.title, "Pilot");
    }
}
