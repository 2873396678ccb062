//! Scene partitioning: split a script into storyboard frame drafts.

use cine_models::{CharacterId, EnvironmentId, FrameDraft, Genre, Manifest};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::GeminiResult;
use crate::gateway::GenerationGateway;
use crate::normalize::parse_structured;
use crate::prompts;
use crate::provider::Provider;
use crate::types::{GenerateContentRequest, GenerationConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartitionResponse {
    frames: Vec<FrameDraft>,
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if the drafts' script segments, joined in order, reproduce `script`.
///
/// Whitespace differences are ignored since models routinely trim segment
/// boundaries.
pub fn script_coverage_matches(script: &str, drafts: &[FrameDraft]) -> bool {
    let joined = drafts
        .iter()
        .filter_map(|d| d.script_segment.as_deref())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined) == collapse_whitespace(script)
}

/// Clear references to manifest entries that do not exist.
fn drop_unknown_references(drafts: &mut [FrameDraft], manifest: &Manifest) {
    for (index, draft) in drafts.iter_mut().enumerate() {
        let character_known = draft
            .character_id
            .as_deref()
            .is_some_and(|id| manifest.character(&CharacterId::from_string(id)).is_some());
        if !character_known {
            if let Some(id) = draft.character_id.take().filter(|id| !id.is_empty()) {
                debug!(frame = index, character_id = %id, "Dropping unknown character reference");
            }
        }

        let environment_known = draft
            .environment_id
            .as_deref()
            .is_some_and(|id| manifest.environment(&EnvironmentId::from_string(id)).is_some());
        if !environment_known {
            if let Some(id) = draft.environment_id.take().filter(|id| !id.is_empty()) {
                debug!(frame = index, environment_id = %id, "Dropping unknown environment reference");
            }
        }
    }
}

impl<P: Provider> GenerationGateway<P> {
    /// Partition a script into ordered frame drafts.
    ///
    /// Segmentation returned by the model is kept as-is; a coverage mismatch
    /// against the script is logged but not repaired.
    pub async fn partition_scene(
        &self,
        script: &str,
        manifest: &Manifest,
        genre: Genre,
    ) -> GeminiResult<Vec<FrameDraft>> {
        let request =
            GenerateContentRequest::text(prompts::scene_partition(script, manifest, genre))
                .with_config(GenerationConfig::json(prompts::partition_schema()));

        let response = self
            .call("partition_scene", &self.config.text_model, &request)
            .await?;

        let parsed: PartitionResponse = parse_structured(response.text().unwrap_or_default());
        let mut drafts = parsed.frames;
        drop_unknown_references(&mut drafts, manifest);

        if !drafts.is_empty() && !script_coverage_matches(script, &drafts) {
            warn!(
                frames = drafts.len(),
                "Frame script segments do not reconstruct the full script"
            );
        }

        info!(frames = drafts.len(), genre = %genre, "Scene partitioned");
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{gateway_with, text_response, ScriptedProvider};
    use cine_models::Character;
    use serde_json::json;

    fn draft(segment: &str) -> FrameDraft {
        FrameDraft {
            script_segment: Some(segment.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_coverage_ignores_whitespace() {
        let script = "INT. HANGAR - NIGHT\n\nMara checks the engine.\nMARA: Ready.";
        let drafts = vec![draft("INT. HANGAR - NIGHT"), draft("Mara checks the engine.\n"), draft("MARA: Ready.")];
        assert!(script_coverage_matches(script, &drafts));

        let missing = vec![draft("INT. HANGAR - NIGHT"), draft("MARA: Ready.")];
        assert!(!script_coverage_matches(script, &missing));
    }

    #[tokio::test]
    async fn test_drafts_keep_order_and_known_references() {
        let mut manifest = Manifest::default();
        let mara = Character::pending(CharacterId::from_string("c-mara"), "Mara", "Pilot", "");
        manifest.characters.push(mara);

        let body = json!({
            "frames": [
                {"title": "Open", "prompt": "wide hangar", "scriptSegment": "Part one.", "characterId": "c-mara", "shotType": "Wide Shot"},
                {"title": "Close", "prompt": "eyes", "scriptSegment": "Part two.", "characterId": "c-ghost", "environmentId": "e-nowhere"}
            ]
        })
        .to_string();
        let gateway = gateway_with(ScriptedProvider::sequence(vec![Ok(text_response(&body))]));

        let drafts = gateway
            .partition_scene("Part one. Part two.", &manifest, Genre::Drama)
            .await
            .unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].script_segment.as_deref(), Some("Part one."));
        assert_eq!(drafts[0].character_id.as_deref(), Some("c-mara"));
        assert_eq!(drafts[1].script_segment.as_deref(), Some("Part two."));
        assert!(drafts[1].character_id.is_none());
        assert!(drafts[1].environment_id.is_none());
    }

    #[tokio::test]
    async fn test_missing_frames_is_empty() {
        let gateway = gateway_with(ScriptedProvider::sequence(vec![Ok(text_response("{}"))]));
        let drafts = gateway
            .partition_scene("anything", &Manifest::default(), Genre::Noir)
            .await
            .unwrap();
        assert!(drafts.is_empty());
    }
}
