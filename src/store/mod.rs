pub mod github;
pub mod local;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use crate::config::{BackendKind, Config};
use crate::place::Place;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("store write failed: {0}")]
    Write(String),
}

/// A place-collection store.
///
/// Request handling depends only on this interface; the concrete impl
/// decides where the collection document and media blobs live. Read
/// failures degrade to an empty result, write failures propagate.
#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Fetch the raw collection document. Every read failure degrades to
    /// `None`: a missing document and an unreachable store are
    /// indistinguishable to callers.
    async fn fetch_document(&self) -> Option<String>;

    /// Write the full collection document back. The message becomes the
    /// commit message on version-controlled backends and is ignored
    /// elsewhere.
    async fn save(&self, places: &[Place], message: &str) -> Result<(), StoreError>;

    /// Commit one media blob at a store-relative path.
    async fn put_blob(&self, path: &str, data: Bytes, message: &str) -> Result<(), StoreError>;

    /// Parse the current document into a collection. Records keep whatever
    /// shape they were stored with; only a document that is not a JSON array
    /// of objects yields an empty collection (as does a missing one).
    async fn load(&self) -> Vec<Place> {
        let Some(text) = self.fetch_document().await else {
            return Vec::new();
        };
        match serde_json::from_str(&text) {
            Ok(places) => places,
            Err(e) => {
                warn!(error = %e, "Stored collection is not valid JSON, starting empty");
                Vec::new()
            }
        }
    }
}

/// Serialize a collection the way it is committed: one pretty-printed array.
pub(crate) fn to_document(places: &[Place]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(places)?)
}

/// Construct the store selected by the configuration.
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn PlaceStore>> {
    match config.backend {
        BackendKind::Github => {
            let settings = config.github.as_ref().ok_or_else(|| {
                anyhow::anyhow!("github backend selected but GITHUB_* settings are missing")
            })?;
            let client =
                crate::github::GithubClient::new(&settings.repo, &settings.branch, &settings.token);
            Ok(Arc::new(github::GithubStore::new(client, &config.data_file)))
        }
        BackendKind::Local => Ok(Arc::new(local::LocalStore::new(
            &config.data_dir,
            &config.data_file,
        ))),
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use super::*;

    /// In-memory store for tests, with optional write-failure injection.
    #[derive(Default)]
    pub struct MemoryStore {
        pub document: Mutex<Option<String>>,
        pub blobs: Mutex<Vec<(String, Bytes)>>,
        /// Reject blob writes once this many have been accepted.
        pub fail_blobs_after: Option<usize>,
        /// Reject every manifest save.
        pub fail_saves: bool,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PlaceStore for MemoryStore {
        async fn fetch_document(&self) -> Option<String> {
            self.document.lock().unwrap().clone()
        }

        async fn save(&self, places: &[Place], _message: &str) -> Result<(), StoreError> {
            if self.fail_saves {
                return Err(StoreError::Write("simulated manifest write failure".into()));
            }
            *self.document.lock().unwrap() = Some(to_document(places)?);
            Ok(())
        }

        async fn put_blob(&self, path: &str, data: Bytes, _message: &str) -> Result<(), StoreError> {
            let mut blobs = self.blobs.lock().unwrap();
            if let Some(limit) = self.fail_blobs_after {
                if blobs.len() >= limit {
                    return Err(StoreError::Write("simulated blob write failure".into()));
                }
            }
            blobs.push((path.to_string(), data));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    #[tokio::test]
    async fn test_load_missing_document_is_empty() {
        let store = MemoryStore::new();
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_document_is_empty() {
        let store = MemoryStore::new();
        *store.document.lock().unwrap() = Some("{oops".into());
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let store = MemoryStore::new();
        let places: Vec<Place> =
            serde_json::from_str(r#"[{"id":"p1","name":"Cafe"},{"id":"p2"}]"#).unwrap();
        store.save(&places, "add place p2").await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].0["id"], "p1");
        assert_eq!(loaded[0].0["name"], "Cafe");
    }

    #[tokio::test]
    async fn test_load_keeps_foreign_record_shapes() {
        let store = MemoryStore::new();
        let raw = r#"[{"id":123,"name":"Cafe","media":"none","files":{"weird":true}}]"#;
        *store.document.lock().unwrap() = Some(raw.into());

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0["id"], 123);

        store.save(&loaded, "update place 123").await.unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&store.fetch_document().await.unwrap()).unwrap();
        assert_eq!(written, serde_json::from_str::<serde_json::Value>(raw).unwrap());
    }
}
