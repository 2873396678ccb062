//! Frame image and asset plate synthesis.

use cine_codec::{to_base64, DataUri};
use cine_models::{AssetKind, CharacterId, EnvironmentId, ImageSource, Manifest};
use tracing::{debug, info, warn};

use crate::error::GeminiResult;
use crate::gateway::GenerationGateway;
use crate::prompts;
use crate::provider::Provider;
use crate::types::{GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};

/// Aspect ratio requested for frames and plates.
pub const IMAGE_ASPECT_RATIO: &str = "16:9";

/// Point of a localized edit, in percent of image width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditPoint {
    pub x: f64,
    pub y: f64,
}

impl EditPoint {
    /// Create a point, clamping both coordinates to `0..=100`.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(0.0, 100.0),
            y: y.clamp(0.0, 100.0),
        }
    }
}

/// Structured hints tying a frame to manifest entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotReferences {
    pub character_id: Option<CharacterId>,
    pub environment_id: Option<EnvironmentId>,
    pub shot_type: Option<String>,
    pub emotion: Option<String>,
}

/// Input to [`GenerationGateway::synthesize_frame_image`].
#[derive(Debug, Clone, Default)]
pub struct FrameImageRequest {
    pub instruction: String,
    pub references: ShotReferences,
    /// Existing image to edit (data URI or remote URL).
    pub base_image: Option<String>,
    /// Where to localize the edit; ignored without a base image.
    pub edit_point: Option<EditPoint>,
}

impl FrameImageRequest {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            ..Default::default()
        }
    }

    pub fn with_references(mut self, references: ShotReferences) -> Self {
        self.references = references;
        self
    }

    /// Turn the request into an edit of `base_image`, optionally localized.
    pub fn editing(mut self, base_image: impl Into<String>, point: Option<EditPoint>) -> Self {
        self.base_image = Some(base_image.into());
        self.edit_point = point;
        self
    }
}

/// Attach a manifest plate only when it is an inline data URI.
fn reference_part(label: &str, image: &ImageSource) -> Option<Part> {
    let ImageSource::Inline(uri) = image else {
        return None;
    };
    match DataUri::parse(uri) {
        Ok(parsed) => Some(Part::inline(parsed.mime_type, parsed.data)),
        Err(e) => {
            warn!(reference = %label, "Skipping unreadable reference plate: {}", e);
            None
        }
    }
}

/// Wrap the first image part of a response as a data URI.
fn image_data_uri(response: &GenerateContentResponse) -> Option<String> {
    response
        .first_inline_data()
        .map(|d| DataUri::new(d.mime_type.clone(), d.data.clone()).to_uri())
}

impl<P: Provider> GenerationGateway<P> {
    /// Generate or edit a storyboard frame image.
    ///
    /// Returns `Ok(None)` when the provider answers without an image part.
    pub async fn synthesize_frame_image(
        &self,
        manifest: &Manifest,
        request: &FrameImageRequest,
    ) -> GeminiResult<Option<String>> {
        let mut parts = Vec::new();
        let mut editing = false;

        if let Some(base) = request.base_image.as_deref().filter(|b| !b.is_empty()) {
            let payload = to_base64(&self.http, base).await;
            if payload.is_empty() {
                warn!("Base image unavailable, generating a fresh frame instead");
            } else {
                parts.push(Part::inline(payload.mime_type, payload.data));
                editing = true;
            }
        }

        let refs = &request.references;
        if let Some(character) = refs.character_id.as_ref().and_then(|id| manifest.character(id)) {
            if let Some(part) = reference_part(&character.name, &character.image) {
                debug!(character = %character.name, "Attaching character reference");
                parts.push(part);
            }
        }
        if let Some(environment) = refs
            .environment_id
            .as_ref()
            .and_then(|id| manifest.environment(id))
        {
            if let Some(part) = reference_part(&environment.name, &environment.image) {
                debug!(environment = %environment.name, "Attaching environment reference");
                parts.push(part);
            }
        }

        let prompt = if editing {
            let point = request.edit_point.map(|p| (p.x, p.y));
            prompts::frame_edit(&request.instruction, point)
        } else {
            prompts::frame_generation(
                &request.instruction,
                refs.shot_type.as_deref(),
                refs.emotion.as_deref(),
            )
        };
        parts.push(Part::text(prompt));

        let body = GenerateContentRequest::from_parts(parts)
            .with_config(GenerationConfig::image(IMAGE_ASPECT_RATIO));
        let response = self
            .call("frame_image", &self.config.image_model, &body)
            .await?;

        let image = image_data_uri(&response);
        if image.is_none() {
            warn!(editing, "Provider returned no image for frame");
        }
        Ok(image)
    }

    /// Generate a reference plate for a character or environment.
    ///
    /// Returns `Ok(None)` when the provider answers without an image part.
    pub async fn synthesize_asset_plate(
        &self,
        name: &str,
        description: &str,
        kind: AssetKind,
    ) -> GeminiResult<Option<String>> {
        let body = GenerateContentRequest::text(prompts::asset_plate(name, description, kind))
            .with_config(GenerationConfig::image(IMAGE_ASPECT_RATIO));
        let response = self
            .call("asset_plate", &self.config.image_model, &body)
            .await?;

        let image = image_data_uri(&response);
        match &image {
            Some(_) => info!(kind = %kind, name = %name, "Asset plate generated"),
            None => warn!(kind = %kind, name = %name, "Provider returned no plate image"),
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeminiError;
    use crate::prompts::STYLE_DIRECTIVE;
    use crate::testing::{empty_response, gateway_with, image_response, ScriptedProvider};
    use cine_models::{Character, Environment};

    fn manifest_with_plates() -> Manifest {
        let mut manifest = Manifest::default();
        let mut mara = Character::pending(CharacterId::from_string("c-mara"), "Mara", "Pilot", "");
        mara.image = ImageSource::Inline("data:image/png;base64,TUFSQQ==".to_string());
        let mut dock = Environment::pending(EnvironmentId::from_string("e-dock"), "Dock", "fog", vec![]);
        dock.image = ImageSource::Remote("https://example.com/dock.png".to_string());
        manifest.characters.push(mara);
        manifest.environments.push(dock);
        manifest
    }

    #[tokio::test]
    async fn test_fresh_frame_attaches_inline_references_only() {
        let gateway = gateway_with(ScriptedProvider::sequence(vec![Ok(image_response("image/png", "SU1H"))]));
        let request = FrameImageRequest::new("Mara waits on the dock").with_references(ShotReferences {
            character_id: Some(CharacterId::from_string("c-mara")),
            environment_id: Some(EnvironmentId::from_string("e-dock")),
            shot_type: Some("Close-Up".to_string()),
            emotion: Some("dread".to_string()),
        });

        let image = gateway
            .synthesize_frame_image(&manifest_with_plates(), &request)
            .await
            .unwrap();
        assert_eq!(image.as_deref(), Some("data:image/png;base64,SU1H"));

        let calls = gateway.provider().calls();
        let parts: Vec<_> = calls[0].request.parts().collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].inline_data.as_ref().unwrap().data, "TUFSQQ==");
        let text = parts[1].text.as_deref().unwrap();
        assert!(text.starts_with(STYLE_DIRECTIVE));
        assert!(text.contains("Close-Up"));
        assert!(text.contains("dread"));

        let config = calls[0].request.generation_config.as_ref().unwrap();
        assert_eq!(config.image_config.as_ref().unwrap().aspect_ratio, "16:9");
    }

    #[tokio::test]
    async fn test_localized_edit_reframes_instruction() {
        let gateway = gateway_with(ScriptedProvider::sequence(vec![Ok(image_response("image/png", "RURJVA=="))]));
        let request = FrameImageRequest::new("add a lantern")
            .editing("data:image/jpeg;base64,QkFTRQ==", Some(EditPoint::new(30.0, 60.0)));

        let image = gateway
            .synthesize_frame_image(&Manifest::default(), &request)
            .await
            .unwrap();
        assert!(image.is_some());

        let calls = gateway.provider().calls();
        let parts: Vec<_> = calls[0].request.parts().collect();
        assert_eq!(parts[0].inline_data.as_ref().unwrap().mime_type, "image/jpeg");
        let text = parts[1].text.as_deref().unwrap();
        assert!(text.contains("Directorial adjustment"));
        assert!(text.contains("30% from the left"));
        assert!(text.contains("60% from the top"));
    }

    #[tokio::test]
    async fn test_unusable_base_image_falls_back_to_generation() {
        let gateway = gateway_with(ScriptedProvider::sequence(vec![Ok(image_response("image/png", "TkVX"))]));
        let request = FrameImageRequest::new("storm rolls in").editing("data:image/png;base64", None);

        gateway
            .synthesize_frame_image(&Manifest::default(), &request)
            .await
            .unwrap();

        let calls = gateway.provider().calls();
        let parts: Vec<_> = calls[0].request.parts().collect();
        assert_eq!(parts.len(), 1);
        assert!(!parts[0].text.as_deref().unwrap().contains("Directorial adjustment"));
    }

    #[tokio::test]
    async fn test_no_image_part_is_none() {
        let gateway = gateway_with(ScriptedProvider::sequence(vec![Ok(empty_response())]));
        let image = gateway
            .synthesize_frame_image(&Manifest::default(), &FrameImageRequest::new("x"))
            .await
            .unwrap();
        assert!(image.is_none());
    }

    #[tokio::test]
    async fn test_plate_prompt_and_failure() {
        let gateway = gateway_with(ScriptedProvider::sequence(vec![
            Ok(image_response("image/png", "UExBVEU=")),
            Err(GeminiError::api(500, "overloaded")),
        ]));

        let plate = gateway
            .synthesize_asset_plate("Dock", "fog-bound pier", AssetKind::Environment)
            .await
            .unwrap();
        assert_eq!(plate.as_deref(), Some("data:image/png;base64,UExBVEU="));

        let err = gateway
            .synthesize_asset_plate("Mara", "pilot", AssetKind::Character)
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::Api { status: 500, .. }));

        let calls = gateway.provider().calls();
        let text = calls[0].request.parts().next().unwrap().text.clone().unwrap();
        assert!(text.contains("establishing shot of Dock"));
    }
}
