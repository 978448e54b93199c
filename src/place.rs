use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const MEDIA_BUCKETS: [&str; 3] = ["images", "audios", "videos"];

/// One user-submitted entry in the collection.
///
/// The record shape is deliberately untyped: callers attach arbitrary
/// fields, and documents written by earlier deployments may carry foreign
/// shapes (numeric ids, odd `media`/`files` values). Everything lives in one
/// ordered map so a load→mutate→save cycle reproduces each record with its
/// keys in arrival order. Only the pieces the ingestion pipeline touches go
/// through the accessors below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Place(pub Map<String, Value>);

impl Place {
    /// Opaque caller-supplied identifier; never validated for uniqueness.
    /// An explicit JSON null counts as absent.
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id").filter(|v| !v.is_null())
    }

    /// Identifier rendered for commit messages.
    pub fn id_label(&self) -> Option<String> {
        match self.id()? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn matches_id(&self, id: &Value) -> bool {
        self.0.get("id") == Some(id)
    }

    /// Materialize the media block with its three buckets. Buckets that
    /// already exist are left alone; a non-object `media` value on the
    /// incoming record is replaced.
    pub fn ensure_media(&mut self) {
        let media = self
            .0
            .entry("media")
            .or_insert_with(|| Value::Object(Map::new()));
        if !media.is_object() {
            *media = Value::Object(Map::new());
        }
        if let Some(obj) = media.as_object_mut() {
            for bucket in MEDIA_BUCKETS {
                obj.entry(bucket).or_insert_with(|| Value::Array(Vec::new()));
            }
        }
    }

    pub fn push_media_ref(&mut self, bucket: &str, reference: String) {
        self.ensure_media();
        if let Some(list) = self
            .0
            .get_mut("media")
            .and_then(|m| m.get_mut(bucket))
            .and_then(Value::as_array_mut)
        {
            list.push(Value::String(reference));
        }
    }

    /// Append a stripped `{name, type}` descriptor to the `files` list. The
    /// raw byte payload is never stored in the manifest.
    pub fn push_file_entry(&mut self, name: &str, content_type: &str) {
        let files = self
            .0
            .entry("files")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !files.is_array() {
            *files = Value::Array(Vec::new());
        }
        if let Some(list) = files.as_array_mut() {
            list.push(serde_json::json!({ "name": name, "type": content_type }));
        }
    }
}

/// An attachment decoded from the request body. Constructed transiently by
/// the body decoder, consumed once by the media ingestor, and discarded
/// after its reference path is recorded.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}
