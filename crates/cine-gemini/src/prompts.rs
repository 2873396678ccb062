//! Prompt text and response schemas for each gateway operation.

use cine_models::{AssetKind, Genre, Manifest};
use serde_json::{json, Value};

/// Style directive prepended to every image instruction.
pub const STYLE_DIRECTIVE: &str = "Cinematic movie storyboard, ultra-realistic production still.";

/// Shot vocabulary offered to the partitioner.
pub const SHOT_TYPES: &[&str] = &[
    "Extreme Wide Shot",
    "Wide Shot",
    "Medium Shot",
    "Over-the-Shoulder",
    "Close-Up",
    "Extreme Close-Up",
    "Low Angle",
    "High Angle",
    "Dutch Angle",
    "Tracking Shot",
];

pub fn manuscript_analysis(manuscript: &str) -> String {
    format!(
        "Act as a world-class production designer. Analyze this manuscript and extract a 'Visual Manifest'.\n\
         Focus on character visual traits, environment moods, and recurring motifs.\n\
         Manuscript: {manuscript}"
    )
}

pub fn scene_partition(script: &str, manifest: &Manifest, genre: Genre) -> String {
    let cast = manifest
        .characters
        .iter()
        .map(|c| format!("- {} (id: {}): {}", c.name, c.id, c.role))
        .collect::<Vec<_>>()
        .join("\n");
    let locations = manifest
        .environments
        .iter()
        .map(|e| format!("- {} (id: {}): {}", e.name, e.id, e.mood))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Act as a film director breaking a {genre} scene into storyboard frames.\n\
         Split the script into consecutive segments, one per frame. Each scriptSegment MUST be \
         copied verbatim from the script, and the segments joined in order MUST reproduce the \
         entire script with nothing omitted or reordered.\n\
         For each frame provide a title, a storyboard image prompt, the scriptSegment, a shotType \
         and a Director's Brief (emotional arc, lighting scheme, camera logic, pacing).\n\
         Vary shotType across frames for visual variety. Choose from: {shots}.\n\
         When a frame features a known character or location, set characterId / environmentId to \
         its id from the lists below; otherwise leave them empty.\n\
         Characters:\n{cast}\n\
         Locations:\n{locations}\n\
         Script: {script}",
        shots = SHOT_TYPES.join(", "),
        cast = if cast.is_empty() { "(none)".to_string() } else { cast },
        locations = if locations.is_empty() { "(none)".to_string() } else { locations },
    )
}

/// Instruction for a fresh frame image.
pub fn frame_generation(instruction: &str, shot_type: Option<&str>, emotion: Option<&str>) -> String {
    let mut prompt = format!("{STYLE_DIRECTIVE} {instruction}");
    if let Some(shot) = shot_type.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!(" Shot type: {shot}."));
    }
    if let Some(emotion) = emotion.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!(" Emotional tone: {emotion}."));
    }
    prompt
}

/// Instruction for an edit applied to a supplied base image.
pub fn frame_edit(instruction: &str, point: Option<(f64, f64)>) -> String {
    match point {
        Some((x, y)) => format!(
            "{STYLE_DIRECTIVE} Directorial adjustment for this frame, localized to the region \
             centered at {x:.0}% from the left and {y:.0}% from the top: {instruction}. \
             Leave the rest of the image unchanged. Maintain cinematic continuity, character \
             likeness, and environment structure."
        ),
        None => format!(
            "{STYLE_DIRECTIVE} Directorial adjustment for this frame: {instruction}. \
             Maintain cinematic continuity, character likeness, and environment structure."
        ),
    }
}

/// Instruction for a character or location reference plate.
pub fn asset_plate(name: &str, description: &str, kind: AssetKind) -> String {
    match kind {
        AssetKind::Character => format!(
            "{STYLE_DIRECTIVE} Character reference plate of {name}: {description}. \
             Centered portrait, neutral studio background, even lighting, full costume visible."
        ),
        AssetKind::Environment => format!(
            "{STYLE_DIRECTIVE} Location plate, establishing shot of {name}: {description}. \
             Wide composition, no characters, atmosphere and lighting true to the mood."
        ),
    }
}

/// Performance direction for speech synthesis.
pub fn performance(text: &str, brief: &str, genre: Genre) -> String {
    format!(
        "Perform the following {genre} line with this direction: {brief}.\n\
         Bracketed cues such as [whispering] or [laughs] describe HOW to deliver the line. \
         Let them shape tone, pace and breath, but never speak the bracketed words aloud.\n\
         Line: {text}"
    )
}

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "characters": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {"type": "STRING"},
                        "role": {"type": "STRING"},
                        "description": {"type": "STRING"}
                    }
                }
            },
            "environments": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {"type": "STRING"},
                        "mood": {"type": "STRING"},
                        "colors": {"type": "ARRAY", "items": {"type": "STRING"}}
                    }
                }
            },
            "motifs": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": {"type": "STRING"},
                        "icon": {"type": "STRING"},
                        "description": {"type": "STRING"}
                    }
                }
            }
        }
    })
}

pub fn partition_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "frames": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {"type": "STRING"},
                        "prompt": {"type": "STRING"},
                        "scriptSegment": {"type": "STRING"},
                        "characterId": {"type": "STRING"},
                        "environmentId": {"type": "STRING"},
                        "shotType": {"type": "STRING"},
                        "directorsBrief": {
                            "type": "OBJECT",
                            "properties": {
                                "emotionalArc": {"type": "STRING"},
                                "lightingScheme": {"type": "STRING"},
                                "cameraLogic": {"type": "STRING"},
                                "pacing": {"type": "STRING"}
                            }
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_prompts_carry_style_directive() {
        assert!(frame_generation("a door opens", None, None).starts_with(STYLE_DIRECTIVE));
        assert!(frame_edit("add rain", None).starts_with(STYLE_DIRECTIVE));
        assert!(asset_plate("Mara", "pilot", AssetKind::Character).starts_with(STYLE_DIRECTIVE));
        assert!(asset_plate("Dock", "foggy", AssetKind::Environment).starts_with(STYLE_DIRECTIVE));
    }

    #[test]
    fn test_localized_edit_mentions_coordinates() {
        let prompt = frame_edit("remove the lamp", Some((25.0, 70.4)));
        assert!(prompt.contains("25% from the left"));
        assert!(prompt.contains("70% from the top"));
        assert!(prompt.contains("remove the lamp"));
    }

    #[test]
    fn test_plate_prompts_differ_by_kind() {
        let character = asset_plate("Mara", "pilot", AssetKind::Character);
        let environment = asset_plate("Mara", "pilot", AssetKind::Environment);
        assert!(character.contains("neutral studio background"));
        assert!(environment.contains("establishing shot"));
    }

    #[test]
    fn test_partition_prompt_lists_manifest_ids() {
        let mut manifest = Manifest::default();
        let mara = cine_models::Character::pending(
            cine_models::CharacterId::new(),
            "Mara",
            "Lead",
            "pilot",
        );
        let id = mara.id.clone();
        manifest.characters.push(mara);

        let prompt = scene_partition("INT. HANGAR", &manifest, Genre::SciFi);
        assert!(prompt.contains(id.as_str()));
        assert!(prompt.contains("Sci-Fi"));
        assert!(prompt.contains("verbatim"));
    }
}
