//! Local backend: the collection is one JSON file under a data directory and
//! media blobs are plain files next to it. Writes overwrite unconditionally;
//! the last writer wins and there is no revision concept.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use super::{to_document, PlaceStore, StoreError};
use crate::place::Place;

pub struct LocalStore {
    base_dir: PathBuf,
    data_file: PathBuf,
}

impl LocalStore {
    pub fn new(base_dir: impl Into<PathBuf>, data_file: &str) -> Self {
        let base_dir = base_dir.into();
        let data_file = base_dir.join(data_file.trim_start_matches('/'));
        Self { base_dir, data_file }
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        // Prevent path traversal
        let key = key.trim_start_matches('/').replace("..", "");
        self.base_dir.join(key)
    }
}

#[async_trait]
impl PlaceStore for LocalStore {
    async fn fetch_document(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.data_file).await {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(error = %e, path = %self.data_file.display(), "Collection read failed, treating as empty");
                None
            }
        }
    }

    async fn save(&self, places: &[Place], _message: &str) -> Result<(), StoreError> {
        let doc = to_document(places)?;
        if let Some(parent) = self.data_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.data_file, doc).await?;
        Ok(())
    }

    async fn put_blob(&self, path: &str, data: Bytes, _message: &str) -> Result<(), StoreError> {
        let dest = self.blob_path(path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, &data).await?;
        debug!(path = %dest.display(), "Media blob written");
        Ok(())
    }
}
