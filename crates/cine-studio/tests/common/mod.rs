//! Shared fixtures for studio integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use cine_codec::{encode_base64, PCM_SAMPLE_RATE};
use cine_gemini::testing::{
    audio_response, gateway_with, image_response, text_response, RecordedCall, ScriptedProvider,
};
use cine_gemini::{GeminiError, GeminiResult};
use cine_gemini::types::GenerateContentResponse;
use cine_media::testing::RecordingEngine;
use cine_media::{ReadyEngine, VideoExporter};
use cine_models::{Genre, SceneState};
use cine_studio::{Studio, StudioConfig};
use serde_json::json;

pub type TestStudio = Studio<ScriptedProvider, ReadyEngine<RecordingEngine>>;

pub const SCRIPT: &str =
    "INT. HANGAR - NIGHT\nMara circles the old jet.\nMARA: She'll fly.\nThe runway lights blink on.";

/// Which gateway operation a recorded call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Analysis,
    Partition,
    Plate,
    Speech,
    FrameImage,
}

pub fn classify(call: &RecordedCall) -> Call {
    let prompt = call.prompt();
    if prompt.contains("Analyze this manuscript") {
        Call::Analysis
    } else if prompt.contains("storyboard frames") {
        Call::Partition
    } else if prompt.contains("reference plate") || prompt.contains("Location plate") {
        Call::Plate
    } else if prompt.contains("Perform the following") {
        Call::Speech
    } else {
        Call::FrameImage
    }
}

pub fn analysis_body() -> String {
    json!({
        "characters": [
            {"name": "Mara", "role": "Pilot", "description": "weathered test pilot"},
            {"name": "Vex", "role": "Mechanic", "description": "grease-stained mechanic"}
        ],
        "environments": [
            {"name": "Hangar", "mood": "cold sodium light", "colors": ["#203040", "#ffaa00"]}
        ],
        "motifs": [
            {"label": "Runway lights", "icon": "lightbulb", "description": "hope", "frequency": "High"}
        ]
    })
    .to_string()
}

pub fn partition_body() -> String {
    json!({
        "frames": [
            {
                "title": "Arrival",
                "prompt": "wide hangar at night",
                "scriptSegment": "INT. HANGAR - NIGHT\n",
                "shotType": "Extreme Wide Shot",
                "directorsBrief": {"emotionalArc": "Isolation", "lightingScheme": "sodium", "cameraLogic": "static", "pacing": "slow"}
            },
            {
                "title": "The Jet",
                "prompt": "pilot circling a jet",
                "scriptSegment": "Mara circles the old jet.\nMARA: She'll fly.\n",
                "shotType": "Medium Shot"
            },
            {
                "title": "Lights",
                "prompt": "runway lights blinking",
                "scriptSegment": "The runway lights blink on.",
                "shotType": "Low Angle",
                "directorsBrief": {"emotionalArc": "Hope"}
            }
        ]
    })
    .to_string()
}

/// Image label per frame prompt, so exported bytes reveal frame order.
pub fn frame_label(prompt: &str) -> &'static str {
    if prompt.contains("wide hangar") {
        "A"
    } else if prompt.contains("circling a jet") {
        "B"
    } else if prompt.contains("runway lights") {
        "C"
    } else {
        "X"
    }
}

pub fn image_of(label: &str) -> GenerateContentResponse {
    image_response("image/png", &encode_base64(label.as_bytes()))
}

/// One second of silent PCM16 mono.
pub fn one_second_of_audio() -> GenerateContentResponse {
    audio_response(&encode_base64(&vec![0u8; PCM_SAMPLE_RATE as usize * 2]))
}

pub fn server_error() -> GeminiError {
    GeminiError::api(500, "internal error")
}

/// Provider answering every operation successfully.
pub fn happy_path(call: &RecordedCall) -> GeminiResult<GenerateContentResponse> {
    Ok(match classify(call) {
        Call::Analysis => text_response(&analysis_body()),
        Call::Partition => text_response(&partition_body()),
        Call::Plate => image_of("plate"),
        Call::Speech => one_second_of_audio(),
        Call::FrameImage => image_of(frame_label(&call.prompt())),
    })
}

pub fn scene() -> SceneState {
    SceneState::new("Night Shift", "Hangar 9", Genre::Drama)
}

pub fn studio_with(provider: ScriptedProvider) -> (TestStudio, Arc<RecordingEngine>) {
    studio_over(provider, scene())
}

pub fn studio_over(provider: ScriptedProvider, scene: SceneState) -> (TestStudio, Arc<RecordingEngine>) {
    let engine = Arc::new(RecordingEngine::new());
    let exporter = VideoExporter::new(ReadyEngine(engine.clone()), reqwest::Client::new());
    let studio = Studio::new(
        gateway_with(provider),
        exporter,
        StudioConfig::default(),
        scene,
    );
    (studio, engine)
}
