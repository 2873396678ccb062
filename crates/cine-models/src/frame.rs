//! Storyboard frames.

use serde::{Deserialize, Serialize};

use crate::{CharacterId, EnvironmentId, FrameId, ImageSource};

/// Directorial metadata attached to a frame by scene partitioning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorsBrief {
    #[serde(default)]
    pub emotional_arc: String,
    #[serde(default)]
    pub lighting_scheme: String,
    #[serde(default)]
    pub camera_logic: String,
    #[serde(default)]
    pub pacing: String,
}

/// One storyboard beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: FrameId,
    pub title: String,
    pub time_range: String,
    pub prompt: String,
    /// Verbatim slice of the scene script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directors_brief: Option<DirectorsBrief>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<EnvironmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot_type: Option<String>,
    #[serde(default)]
    pub image: ImageSource,
    /// True only while an image request is outstanding for this frame.
    #[serde(default)]
    pub is_generating: bool,
    /// Raw PCM16 mono audio, base64-encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
    /// True only while a speech request is outstanding for this frame.
    #[serde(default)]
    pub is_generating_audio: bool,
}

impl Frame {
    /// Create an empty frame with a pending image.
    pub fn new(id: FrameId, title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            time_range: String::new(),
            prompt: prompt.into(),
            script_segment: None,
            directors_brief: None,
            character_id: None,
            environment_id: None,
            shot_type: None,
            image: ImageSource::Pending,
            is_generating: false,
            audio_data: None,
            is_generating_audio: false,
        }
    }

    /// Materialize a partition draft as the `index`-th frame of a storyboard.
    ///
    /// The frame starts with a pending image and `is_generating` set, since the
    /// caller is about to request its image.
    pub fn from_draft(id: FrameId, index: usize, draft: FrameDraft) -> Self {
        let title = if draft.title.trim().is_empty() {
            format!("Frame {:02}", index + 1)
        } else {
            draft.title
        };

        Self {
            id,
            title,
            time_range: time_range_for_slot(index, 5),
            prompt: draft.prompt,
            script_segment: draft.script_segment.filter(|s| !s.is_empty()),
            directors_brief: draft.directors_brief,
            character_id: draft.character_id.map(CharacterId::from_string),
            environment_id: draft.environment_id.map(EnvironmentId::from_string),
            shot_type: draft.shot_type.filter(|s| !s.is_empty()),
            image: ImageSource::Pending,
            is_generating: true,
            audio_data: None,
            is_generating_audio: false,
        }
    }

    /// The frame's emotional arc, if its brief carries one.
    pub fn emotion(&self) -> Option<&str> {
        self.directors_brief
            .as_ref()
            .map(|b| b.emotional_arc.as_str())
            .filter(|s| !s.is_empty())
    }

    /// True if the frame has both a resolved image and synthesized audio.
    pub fn is_exportable(&self) -> bool {
        self.image.is_resolved() && self.audio_data.as_deref().is_some_and(|a| !a.is_empty())
    }
}

/// A frame as proposed by scene partitioning, before ids are assigned.
///
/// Every field tolerates absence so that schema drift in the provider
/// output degrades to defaults instead of failing the whole partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameDraft {
    pub title: String,
    pub prompt: String,
    pub script_segment: Option<String>,
    pub character_id: Option<String>,
    pub environment_id: Option<String>,
    pub shot_type: Option<String>,
    pub directors_brief: Option<DirectorsBrief>,
}

/// Format the `index`-th fixed-length slot as `mm:ss - mm:ss`.
pub fn time_range_for_slot(index: usize, slot_secs: u64) -> String {
    let start = index as u64 * slot_secs;
    let end = start + slot_secs;
    format!("{} - {}", mmss(start), mmss(end))
}

fn mmss(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_slots() {
        assert_eq!(time_range_for_slot(0, 5), "00:00 - 00:05");
        assert_eq!(time_range_for_slot(2, 5), "00:10 - 00:15");
        assert_eq!(time_range_for_slot(12, 5), "01:00 - 01:05");
    }

    #[test]
    fn test_from_draft_sets_generating_and_pending() {
        let draft = FrameDraft {
            title: String::new(),
            prompt: "Wide shot of the alley".into(),
            script_segment: Some("The rain slicks the pavement.".into()),
            character_id: Some("c1".into()),
            shot_type: Some("Wide".into()),
            ..Default::default()
        };

        let frame = Frame::from_draft(FrameId::from("f1"), 1, draft);
        assert_eq!(frame.title, "Frame 02");
        assert_eq!(frame.time_range, "00:05 - 00:10");
        assert!(frame.is_generating);
        assert!(!frame.image.is_resolved());
        assert_eq!(frame.character_id, Some(CharacterId::from("c1")));
        assert!(!frame.is_exportable());
    }

    #[test]
    fn test_is_exportable_requires_image_and_audio() {
        let mut frame = Frame::new(FrameId::from("f1"), "Frame 01", "prompt");
        frame.image = ImageSource::from("https://example.com/f1.png");
        assert!(!frame.is_exportable());

        frame.audio_data = Some(String::new());
        assert!(!frame.is_exportable());

        frame.audio_data = Some("AAAA".into());
        assert!(frame.is_exportable());
    }

    #[test]
    fn test_draft_tolerates_missing_fields() {
        let draft: FrameDraft = serde_json::from_str(r#"{"prompt":"x"}"#).unwrap();
        assert_eq!(draft.prompt, "x");
        assert!(draft.directors_brief.is_none());
    }
}
