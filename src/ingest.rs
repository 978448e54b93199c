//! Media ingestor: persists uploaded file bytes and records their reference
//! paths on the place record.

use crate::place::{Place, UploadedFile};
use crate::store::{PlaceStore, StoreError};

/// Commit each uploaded file to `<media_dir>/<filename>` and append its
/// reference path into the record's media bucket for its MIME class.
///
/// Files are written strictly in arrival order, one at a time; a failed
/// write aborts the request and leaves the files committed so far in the
/// store with no rollback. MIME types outside image/audio/video are still
/// committed but referenced only through the stripped `files` descriptor.
pub async fn ingest_media(
    store: &dyn PlaceStore,
    media_dir: &str,
    place: &mut Place,
    files: Vec<UploadedFile>,
) -> Result<(), StoreError> {
    // Submitted records always carry the media block, even with no uploads.
    place.ensure_media();

    for file in files {
        let path = format!("{}/{}", media_dir.trim_matches('/'), file.name);
        store
            .put_blob(&path, file.data, &format!("add media {}", file.name))
            .await?;

        let bucket = if file.content_type.starts_with("image/") {
            Some("images")
        } else if file.content_type.starts_with("audio/") {
            Some("audios")
        } else if file.content_type.starts_with("video/") {
            Some("videos")
        } else {
            None
        };
        if let Some(bucket) = bucket {
            place.push_media_ref(bucket, format!("/{path}"));
        }

        place.push_file_entry(&file.name, &file.content_type);
    }

    Ok(())
}
