//! Remote backend: the collection document and media blobs are files in a
//! version-controlled repository, written through the contents API.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use super::{to_document, PlaceStore, StoreError};
use crate::github::GithubClient;
use crate::place::Place;

pub struct GithubStore {
    client: GithubClient,
    data_file: String,
}

impl GithubStore {
    pub fn new(client: GithubClient, data_file: &str) -> Self {
        Self {
            client,
            data_file: data_file.trim_start_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PlaceStore for GithubStore {
    async fn fetch_document(&self) -> Option<String> {
        match self.client.fetch_raw(&self.data_file).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, path = %self.data_file, "Collection read failed, treating as empty");
                None
            }
        }
    }

    async fn save(&self, places: &[Place], message: &str) -> Result<(), StoreError> {
        let doc = to_document(places)?;
        self.client
            .commit(&self.data_file, doc.as_bytes(), message)
            .await
    }

    async fn put_blob(&self, path: &str, data: Bytes, message: &str) -> Result<(), StoreError> {
        self.client.commit(path, &data, message).await
    }
}
