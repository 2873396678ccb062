//! Manuscript import and optimistic manifest inserts.

mod common;

use cine_gemini::testing::{text_response, ScriptedProvider};
use cine_models::{CharacterId, EnvironmentId, ImageSource};
use cine_studio::{AssetRef, ImportSummary, StudioError};

use common::*;

#[tokio::test]
async fn test_failed_character_plate_rolls_back_insert() {
    let provider = ScriptedProvider::new(|call| match classify(call) {
        Call::Plate => Err(server_error()),
        _ => happy_path(call),
    });
    let (studio, _) = studio_with(provider);

    let pending = studio
        .add_character("Mara", "Pilot", "weathered test pilot")
        .await
        .unwrap();
    let AssetRef::Character(id) = pending.asset.clone() else {
        panic!("expected a character");
    };

    let scene = studio.snapshot().await.unwrap();
    let inserted = scene.manifest.character(&id).expect("present right after add");
    assert_eq!(inserted.image, ImageSource::Pending);

    assert!(!pending.settled().await);
    let scene = studio.snapshot().await.unwrap();
    assert!(scene.manifest.character(&id).is_none());
}

#[tokio::test]
async fn test_empty_plate_response_also_rolls_back() {
    let provider = ScriptedProvider::new(|call| match classify(call) {
        Call::Plate => Ok(text_response("no image today")),
        _ => happy_path(call),
    });
    let (studio, _) = studio_with(provider);

    let pending = studio
        .add_environment("Hangar", "cold sodium light", vec!["#203040".into()])
        .await
        .unwrap();
    let id = EnvironmentId::from_string(pending.id());

    assert!(!pending.settled().await);
    let scene = studio.snapshot().await.unwrap();
    assert!(scene.manifest.environment(&id).is_none());
}

#[tokio::test]
async fn test_successful_plate_patches_only_its_entry() {
    let (studio, _) = studio_with(ScriptedProvider::new(happy_path));

    let first = studio.add_character("Mara", "Pilot", "pilot").await.unwrap();
    let second = studio.add_character("Vex", "Mechanic", "mechanic").await.unwrap();
    let first_id = CharacterId::from_string(first.id());
    let second_id = CharacterId::from_string(second.id());

    assert!(first.settled().await);
    assert!(second.settled().await);

    let scene = studio.snapshot().await.unwrap();
    assert_eq!(scene.manifest.characters.len(), 2);
    for id in [&first_id, &second_id] {
        let character = scene.manifest.character(id).unwrap();
        assert!(character.image.is_inline());
    }
    assert_eq!(scene.manifest.character(&first_id).unwrap().name, "Mara");
}

#[tokio::test]
async fn test_import_builds_manifest_and_drops_failed_plates() {
    let provider = ScriptedProvider::new(|call| match classify(call) {
        Call::Plate if call.prompt().contains("Vex") => Err(server_error()),
        _ => happy_path(call),
    });
    let (studio, _) = studio_with(provider);

    let summary = studio.import_manuscript(SCRIPT).await.unwrap();
    assert_eq!(summary.characters, 2);
    assert_eq!(summary.environments, 1);
    assert_eq!(summary.motifs, 1);
    assert_eq!(summary.plates_resolved, 2);
    assert_eq!(summary.plates_failed, 1);

    let scene = studio.snapshot().await.unwrap();
    assert_eq!(scene.script, SCRIPT);
    let names: Vec<_> = scene.manifest.characters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Mara"]);
    assert!(scene.manifest.characters[0].image.is_inline());
    assert_eq!(scene.manifest.environments[0].colors, vec!["#203040", "#ffaa00"]);
    assert_eq!(scene.manifest.motifs[0].frequency.as_deref(), Some("High"));
}

#[tokio::test]
async fn test_failed_analysis_leaves_scene_untouched() {
    let provider = ScriptedProvider::new(|call| match classify(call) {
        Call::Analysis => Err(server_error()),
        _ => happy_path(call),
    });
    let (studio, _) = studio_with(provider);
    let before = studio.snapshot().await.unwrap();

    let err = studio.import_manuscript(SCRIPT).await.unwrap_err();
    assert!(matches!(err, StudioError::Gemini(_)));
    assert_eq!(studio.snapshot().await.unwrap(), before);
}

#[tokio::test]
async fn test_malformed_analysis_yields_empty_manifest() {
    let provider = ScriptedProvider::new(|call| match classify(call) {
        Call::Analysis => Ok(text_response("Sorry, I can't produce JSON right now.")),
        _ => happy_path(call),
    });
    let (studio, _) = studio_with(provider);

    let summary = studio.import_manuscript(SCRIPT).await.unwrap();
    assert_eq!(summary, ImportSummary::default());

    let scene = studio.snapshot().await.unwrap();
    assert_eq!(scene.script, SCRIPT);
    assert!(scene.manifest.characters.is_empty());
}
