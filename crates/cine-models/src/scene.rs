//! The scene document root.

use serde::{Deserialize, Serialize};

use crate::{Frame, FrameId, Genre, Manifest};

/// One sample of the sentiment curve shown alongside the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSample {
    pub time: String,
    pub value: f64,
    #[serde(default)]
    pub suspense: f64,
}

/// Single mutable root of a storyboard session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneState {
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub genre: Genre,
    #[serde(default)]
    pub manifest: Manifest,
    #[serde(default)]
    pub frames: Vec<Frame>,
    /// Display-only; not consumed by generation or export.
    #[serde(default)]
    pub sentiment_data: Vec<SentimentSample>,
}

impl SceneState {
    pub fn new(title: impl Into<String>, location: impl Into<String>, genre: Genre) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
            genre,
            ..Default::default()
        }
    }

    pub fn frame(&self, id: &FrameId) -> Option<&Frame> {
        self.frames.iter().find(|f| &f.id == id)
    }

    pub fn frame_mut(&mut self, id: &FrameId) -> Option<&mut Frame> {
        self.frames.iter_mut().find(|f| &f.id == id)
    }
}
