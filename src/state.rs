use std::sync::Arc;

use crate::config::{BackendKind, Config};
use crate::store::PlaceStore;

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn PlaceStore>,
    /// Store-relative directory ingested media is committed under.
    pub media_dir: String,
    pub backend: BackendKind,
}

impl AppState {
    pub fn new(store: Arc<dyn PlaceStore>, config: &Config) -> Self {
        Self {
            store,
            media_dir: config.media_dir.clone(),
            backend: config.backend,
        }
    }

    /// Record replace/remove exist only on the local backend; the remote
    /// deployment answers 405 for those verbs.
    pub fn local_mutations(&self) -> bool {
        self.backend == BackendKind::Local
    }
}
