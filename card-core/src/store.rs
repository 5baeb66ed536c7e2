//! Card persistence.
//!
//! [`CardRepository`] writes card documents to a remote [`DocumentStore`].
//! When the remote write fails it writes the same payload to a device-local
//! [`FallbackStore`] and still returns an id, so share links stay
//! constructible (they will only resolve on this device).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::card::CardModel;
use crate::document::CardDocument;

/// Collection that holds card documents.
pub const CARDS_COLLECTION: &str = "cards";

/// Prefix of ids issued by the fallback path.
pub const FALLBACK_ID_PREFIX: &str = "local-";

/// Warning surfaced when a card was only saved locally.
pub const FALLBACK_WARNING: &str =
    "Card saved on this device only. Sharing may be limited to this device.";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// The store refused the request.
    #[error("Store rejected request: {0}")]
    Rejected(String),
    /// An I/O error occurred during local persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Errors returned when reading a card by id.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No card exists under the id.
    #[error("Card not found: {0}")]
    NotFound(String),
    /// The card could not be loaded.
    #[error("Failed to load card: {0}")]
    Store(#[from] StoreError),
}

/// A remote key-value document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a document under `collection/id`, replacing any existing one.
    async fn put(&self, collection: &str, id: &str, document: &Value) -> Result<(), StoreError>;

    /// Read a document. `Ok(None)` means it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;
}

/// In-process document store.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<(String, String), Value>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, collection: &str, id: &str, document: &Value) -> Result<(), StoreError> {
        self.documents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert((collection.to_string(), id.to_string()), document.clone());
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }
}

/// Device-local store used when the remote write fails.
///
/// Documents are kept in memory and, when a data directory is configured,
/// written as one JSON file per card.
#[derive(Debug, Clone, Default)]
pub struct FallbackStore {
    cards: Arc<RwLock<HashMap<String, CardDocument>>>,
    data_dir: Option<PathBuf>,
}

impl FallbackStore {
    /// Memory-only fallback store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Fallback store persisted under `data_dir`.
    ///
    /// The directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            cards: Arc::default(),
            data_dir: Some(data_dir),
        })
    }

    /// Directory backing the store, if any.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Store a card document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written to disk.
    pub fn put(&self, id: &str, document: &CardDocument) -> Result<(), StoreError> {
        if let Some(ref data_dir) = self.data_dir {
            let json = serde_json::to_string_pretty(document)?;
            std::fs::write(data_dir.join(format!("{}.json", sanitize_filename(id))), json)?;
        }
        self.cards
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    /// Read a card document, checking memory first and then disk.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed.
    pub fn get(&self, id: &str) -> Result<Option<CardDocument>, StoreError> {
        if let Some(doc) = self
            .cards
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
        {
            return Ok(Some(doc.clone()));
        }
        let Some(ref data_dir) = self.data_dir else {
            return Ok(None);
        };
        let path = data_dir.join(format!("{}.json", sanitize_filename(id)));
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let doc: CardDocument = serde_json::from_str(&contents)?;
        Ok(Some(doc))
    }

    /// Ids held in memory.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.cards
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

/// Result of [`CardRepository::save`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SaveOutcome {
    /// Id to build share links from.
    pub id: String,
    /// Whether the card only reached the fallback store.
    pub fallback: bool,
    /// User-visible warning for the fallback case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Saves and loads cards with remote-first, local-fallback semantics.
#[derive(Clone)]
pub struct CardRepository {
    remote: Arc<dyn DocumentStore>,
    fallback: FallbackStore,
}

impl std::fmt::Debug for CardRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardRepository")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl CardRepository {
    /// Create a repository.
    #[must_use]
    pub fn new(remote: Arc<dyn DocumentStore>, fallback: FallbackStore) -> Self {
        Self { remote, fallback }
    }

    /// The local fallback store.
    #[must_use]
    pub fn fallback(&self) -> &FallbackStore {
        &self.fallback
    }

    /// Save a card.
    ///
    /// Remote failures are not fatal: the document goes to the fallback
    /// store under a `local-` id and the outcome carries a warning.
    ///
    /// # Errors
    ///
    /// Returns an error only if the document cannot be serialized or both
    /// the remote and the fallback writes fail.
    pub async fn save(
        &self,
        model: &CardModel,
        image_generated: bool,
    ) -> Result<SaveOutcome, StoreError> {
        let document = CardDocument::from_model(model, image_generated, current_timestamp_ms());
        let value = serde_json::to_value(&document)?;
        let id = Uuid::new_v4().simple().to_string();

        match self.remote.put(CARDS_COLLECTION, &id, &value).await {
            Ok(()) => {
                tracing::info!(card_id = %id, "Card saved");
                Ok(SaveOutcome {
                    id,
                    fallback: false,
                    warning: None,
                })
            }
            Err(e) => {
                let local_id = format!("{FALLBACK_ID_PREFIX}{}", Uuid::new_v4().simple());
                tracing::warn!(card_id = %local_id, "Remote save failed, using local fallback: {e}");
                self.fallback.put(&local_id, &document)?;
                Ok(SaveOutcome {
                    id: local_id,
                    fallback: true,
                    warning: Some(FALLBACK_WARNING.to_string()),
                })
            }
        }
    }

    /// Load a card by id.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NotFound`] when no store has the card and
    /// [`LoadError::Store`] when it could not be read.
    pub async fn load(&self, id: &str) -> Result<CardDocument, LoadError> {
        if id.starts_with(FALLBACK_ID_PREFIX) {
            return self
                .fallback
                .get(id)?
                .ok_or_else(|| LoadError::NotFound(id.to_string()));
        }

        match self.remote.get(CARDS_COLLECTION, id).await {
            Ok(Some(value)) => Ok(serde_json::from_value(value).map_err(StoreError::from)?),
            Ok(None) => Err(LoadError::NotFound(id.to_string())),
            Err(e) => {
                tracing::warn!(card_id = %id, "Remote load failed: {e}");
                match self.fallback.get(id) {
                    Ok(Some(doc)) => Ok(doc),
                    _ => Err(LoadError::Store(e)),
                }
            }
        }
    }
}

/// Sanitize an id for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Get the current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DownStore;

    #[async_trait]
    impl DocumentStore for DownStore {
        async fn put(&self, _: &str, _: &str, _: &Value) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }

        async fn get(&self, _: &str, _: &str) -> Result<Option<Value>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
    }

    fn card() -> CardModel {
        let mut model = CardModel::new();
        model.name = "Linus".into();
        model.add_tech_by_id("git").expect("git");
        model
    }

    #[tokio::test]
    async fn test_save_to_remote() {
        let remote = MemoryDocumentStore::new();
        let repo = CardRepository::new(Arc::new(remote.clone()), FallbackStore::in_memory());

        let outcome = repo.save(&card(), true).await.expect("save");
        assert!(!outcome.fallback);
        assert!(outcome.warning.is_none());
        assert!(!outcome.id.starts_with(FALLBACK_ID_PREFIX));
        assert_eq!(remote.len(), 1);
        assert!(repo.fallback().ids().is_empty());

        let doc = repo.load(&outcome.id).await.expect("load");
        assert_eq!(doc.name, "Linus");
        assert_eq!(doc.image.as_deref(), Some("generated"));
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back() {
        let repo = CardRepository::new(Arc::new(DownStore), FallbackStore::in_memory());

        let outcome = repo.save(&card(), false).await.expect("save never fails");
        assert!(outcome.fallback);
        assert!(outcome.id.starts_with(FALLBACK_ID_PREFIX));
        assert_eq!(outcome.warning.as_deref(), Some(FALLBACK_WARNING));

        let doc = repo.load(&outcome.id).await.expect("load from fallback");
        assert_eq!(doc.to_model(), card());
    }

    #[tokio::test]
    async fn test_not_found_is_distinct_from_store_error() {
        let repo = CardRepository::new(
            Arc::new(MemoryDocumentStore::new()),
            FallbackStore::in_memory(),
        );
        assert!(matches!(
            repo.load("missing").await,
            Err(LoadError::NotFound(_))
        ));
        assert!(matches!(
            repo.load("local-missing").await,
            Err(LoadError::NotFound(_))
        ));

        let down = CardRepository::new(Arc::new(DownStore), FallbackStore::in_memory());
        assert!(matches!(
            down.load("abc").await,
            Err(LoadError::Store(StoreError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_remote_document_is_load_error() {
        let remote = MemoryDocumentStore::new();
        remote
            .put(CARDS_COLLECTION, "bad", &serde_json::json!({"name": 42}))
            .await
            .expect("put");
        let repo = CardRepository::new(Arc::new(remote), FallbackStore::in_memory());
        assert!(matches!(
            repo.load("bad").await,
            Err(LoadError::Store(StoreError::Serialization(_)))
        ));
    }

    #[test]
    fn test_fallback_persists_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = CardDocument::from_model(&card(), false, 42);
        {
            let store = FallbackStore::with_data_dir(dir.path()).expect("store");
            store.put("local-abc", &doc).expect("put");
        }
        let store = FallbackStore::with_data_dir(dir.path()).expect("store");
        assert_eq!(store.get("local-abc").expect("get"), Some(doc));
        assert_eq!(store.get("local-nope").expect("get"), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_filename("local-abc_1"), "local-abc_1");
    }
}
