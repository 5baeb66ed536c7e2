//! Integration tests for the wizard and the persistence adapter.
//!
//! Walks a card through the wizard, then saves it against a failing remote
//! store to exercise the local fallback path end to end.

use std::sync::Arc;

use async_trait::async_trait;
use card_core::store::{FALLBACK_ID_PREFIX, FALLBACK_WARNING};
use card_core::{
    CardDocument, CardModel, CardRepository, CardWizard, Category, CroppedPhoto, DocumentStore,
    FallbackStore, LoadError, MemoryDocumentStore, Step, StoreError,
};
use serde_json::Value;

/// Remote store whose writes always fail.
struct RejectingStore;

#[async_trait]
impl DocumentStore for RejectingStore {
    async fn put(&self, _: &str, _: &str, _: &Value) -> Result<(), StoreError> {
        Err(StoreError::Rejected("quota exceeded".into()))
    }

    async fn get(&self, _: &str, _: &str) -> Result<Option<Value>, StoreError> {
        Ok(None)
    }
}

fn filled_wizard() -> CardWizard {
    let mut wizard = CardWizard::new();
    wizard.model_mut().photo = CroppedPhoto::from_data_url("data:image/jpeg;base64,/9j/4AAQ");
    wizard.next().expect("photo");

    let model = wizard.model_mut();
    model.name = "Margaret".into();
    model.role = "Flight software".into();
    model.bio = "Wrote the code that landed on the moon.".into();
    wizard.next().expect("identity");

    wizard
        .model_mut()
        .set_custom_theme("#101010", "#abcdef")
        .expect("theme");
    wizard.next().expect("theme");

    for id in ["python", "rust", "go", "java", "kotlin"] {
        wizard.model_mut().add_tech_by_id(id).expect("language");
    }
    wizard.model_mut().add_tech_by_id("docker").expect("tool");
    wizard.next().expect("tech");

    wizard.model_mut().socials.website = Some("https://margaret.dev".into());
    wizard.next().expect("socials");
    wizard
}

// ===========================================================================
// Wizard
// ===========================================================================

#[test]
fn test_sixth_technology_is_rejected_in_wizard() {
    let mut wizard = filled_wizard();
    assert_eq!(wizard.step(), Step::Preview);

    let err = wizard
        .model_mut()
        .add_tech_by_id("swift")
        .expect_err("category full");
    assert!(err.to_string().contains("up to 5"));
    assert_eq!(wizard.model().tech.get(Category::Languages).len(), 5);
}

#[test]
fn test_profane_name_does_not_advance() {
    let mut wizard = CardWizard::new();
    wizard.model_mut().photo = CroppedPhoto::from_data_url("data:image/png;base64,iVBO");
    wizard.next().expect("photo");

    wizard.model_mut().name = "f***".into();
    assert!(wizard.next().is_err());
    assert_eq!(wizard.step(), Step::Identity);
    assert!(wizard.go_to(Step::Theme).is_err());

    wizard.model_mut().name = "Frank".into();
    assert_eq!(wizard.next().expect("clean name"), Step::Theme);
}

// ===========================================================================
// Persistence
// ===========================================================================

#[tokio::test]
async fn test_fallback_round_trip() {
    let wizard = filled_wizard();
    let snapshot = wizard.snapshot();
    let repo = CardRepository::new(Arc::new(RejectingStore), FallbackStore::in_memory());

    let outcome = repo.save(&snapshot, true).await.expect("save");
    assert!(!outcome.id.is_empty());
    assert!(outcome.id.starts_with(FALLBACK_ID_PREFIX));
    assert!(outcome.fallback);
    assert_eq!(outcome.warning.as_deref(), Some(FALLBACK_WARNING));

    let stored = repo
        .fallback()
        .get(&outcome.id)
        .expect("read")
        .expect("present");
    let expected = CardDocument::from_model(&snapshot, true, stored.created_at);
    assert_eq!(stored, expected);
    assert_eq!(stored.photo, Some(true));

    let without_photo = CardModel {
        photo: None,
        ..snapshot
    };
    assert_eq!(stored.to_model(), without_photo);
}

#[tokio::test]
async fn test_fallback_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = {
        let repo = CardRepository::new(
            Arc::new(RejectingStore),
            FallbackStore::with_data_dir(dir.path()).expect("fallback"),
        );
        repo.save(&filled_wizard().snapshot(), false)
            .await
            .expect("save")
            .id
    };

    let repo = CardRepository::new(
        Arc::new(MemoryDocumentStore::new()),
        FallbackStore::with_data_dir(dir.path()).expect("fallback"),
    );
    let doc = repo.load(&id).await.expect("load");
    assert_eq!(doc.name, "Margaret");
    assert!(doc.image.is_none());
}

#[tokio::test]
async fn test_unknown_remote_id_is_not_found() {
    let repo = CardRepository::new(
        Arc::new(MemoryDocumentStore::new()),
        FallbackStore::in_memory(),
    );
    let err = repo.load("does-not-exist").await.expect_err("missing");
    assert!(matches!(err, LoadError::NotFound(ref id) if id == "does-not-exist"));
}
