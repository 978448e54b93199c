//! Body decoder: turns a raw request (headers + bytes) into a place record
//! plus the list of uploaded files attached to it.

use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use axum::http::{header, HeaderMap, Request};
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;

use crate::place::{Place, UploadedFile};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("invalid multipart body: {0}")]
    Multipart(String),
    #[error("invalid base64 data for file '{name}'")]
    FileData { name: String },
}

/// Pre-encoded attachment as it appears in a JSON `files` array.
#[derive(Deserialize)]
struct WireFile {
    name: String,
    #[serde(rename = "type", default)]
    content_type: String,
    #[serde(default)]
    data: String,
}

/// Decode a request body into `(record, files)`.
///
/// A multipart content type routes to the form parser; everything else is
/// treated as one JSON document. Both paths tolerate a body the transport
/// layer base64-encoded as a whole.
pub async fn decode_body(
    headers: &HeaderMap,
    body: Bytes,
) -> Result<(Place, Vec<UploadedFile>), DecodeError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        decode_multipart(content_type, body).await
    } else {
        decode_json(&body)
    }
}

/// Parse one JSON document into a record. A top-level `files` array is the
/// attachment list (entries `{name, type, data}` with base64 data) and is
/// removed from the record; every other field is kept as-is.
pub fn decode_json(body: &[u8]) -> Result<(Place, Vec<UploadedFile>), DecodeError> {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        // The body may be transport-base64-encoded; decode once and retry
        // before rejecting.
        Err(err) => match base64::engine::general_purpose::STANDARD.decode(body.trim_ascii()) {
            Ok(decoded) => serde_json::from_slice(&decoded)?,
            Err(_) => return Err(DecodeError::Json(err)),
        },
    };

    let serde_json::Value::Object(mut obj) = value else {
        return Err(DecodeError::NotAnObject);
    };

    // A non-array `files` property is not an attachment list; it stays on
    // the record as caller data.
    let mut files = Vec::new();
    if matches!(obj.get("files"), Some(serde_json::Value::Array(_))) {
        if let Some(serde_json::Value::Array(entries)) = obj.remove("files") {
            files = entries
                .into_iter()
                .map(decode_wire_file)
                .collect::<Result<Vec<_>, _>>()?;
        }
    }

    Ok((Place(obj), files))
}

fn decode_wire_file(entry: serde_json::Value) -> Result<UploadedFile, DecodeError> {
    let wire: WireFile = serde_json::from_value(entry)?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(wire.data.as_bytes())
        .map_err(|_| DecodeError::FileData {
            name: wire.name.clone(),
        })?;
    Ok(UploadedFile {
        name: wire.name,
        content_type: wire.content_type,
        data: Bytes::from(data),
    })
}

/// Parse a multipart form. A `payload` text field, when present, carries the
/// record as JSON (including any inline `files` array); otherwise the flat
/// text-field map is the record. File parts keep their arrival order.
async fn decode_multipart(
    content_type: &str,
    body: Bytes,
) -> Result<(Place, Vec<UploadedFile>), DecodeError> {
    // A transport-base64 body decodes cleanly under the strict engine; a raw
    // multipart body never does (boundary lines contain '-' and CRLF).
    let body = match base64::engine::general_purpose::STANDARD.decode(body.trim_ascii()) {
        Ok(decoded) => Bytes::from(decoded),
        Err(_) => body,
    };

    let request = Request::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .map_err(|e| DecodeError::Multipart(e.to_string()))?;
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| DecodeError::Multipart(e.to_string()))?;

    let mut fields = serde_json::Map::new();
    let mut payload: Option<String> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DecodeError::Multipart(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = match field.content_type() {
                Some(ct) => ct.to_string(),
                None => mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .to_string(),
            };
            let data = field
                .bytes()
                .await
                .map_err(|e| DecodeError::Multipart(e.to_string()))?;
            files.push(UploadedFile {
                name: file_name,
                content_type,
                data,
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| DecodeError::Multipart(e.to_string()))?;
            if name == "payload" {
                payload = Some(text);
            } else {
                fields.insert(name, serde_json::Value::String(text));
            }
        }
    }

    match payload {
        Some(text) => {
            let (place, mut all_files) = decode_json(text.as_bytes())?;
            all_files.extend(files);
            Ok((place, all_files))
        }
        None => Ok((Place(fields), files)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        headers
    }

    fn multipart_headers(boundary: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}")
                .parse()
                .unwrap(),
        );
        headers
    }

    fn encode(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }

    #[tokio::test]
    async fn test_plain_json_body() {
        let body = Bytes::from(r#"{"id":"p1","name":"Cafe"}"#);
        let (place, files) = decode_body(&json_headers(), body).await.unwrap();
        assert_eq!(place.0["id"], "p1");
        assert_eq!(place.0["name"], "Cafe");
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_numeric_id_is_accepted() {
        let body = Bytes::from(r#"{"id":123,"name":"Cafe"}"#);
        let (place, _) = decode_body(&json_headers(), body).await.unwrap();
        assert_eq!(place.0["id"], 123);
        assert_eq!(place.id_label().as_deref(), Some("123"));
    }

    #[tokio::test]
    async fn test_json_body_with_files_array() {
        let body = Bytes::from(format!(
            r#"{{"id":"p1","files":[{{"name":"a.jpg","type":"image/jpeg","data":"{}"}}]}}"#,
            encode(b"jpegdata"),
        ));
        let (place, files) = decode_body(&json_headers(), body).await.unwrap();
        // The files array is consumed, not left on the record
        assert!(place.0.get("files").is_none());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.jpg");
        assert_eq!(files[0].content_type, "image/jpeg");
        assert_eq!(files[0].data.as_ref(), b"jpegdata");
    }

    #[tokio::test]
    async fn test_transport_base64_json_body() {
        let body = Bytes::from(encode(br#"{"id":"p1"}"#));
        let (place, _) = decode_body(&json_headers(), body).await.unwrap();
        assert_eq!(place.0["id"], "p1");
    }

    #[tokio::test]
    async fn test_non_array_files_left_on_record() {
        let body = Bytes::from(r#"{"id":"p1","files":{"weird":true}}"#);
        let (place, files) = decode_body(&json_headers(), body).await.unwrap();
        assert!(files.is_empty());
        assert_eq!(place.0["files"], serde_json::json!({"weird": true}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let body = Bytes::from("{not json");
        let err = decode_body(&json_headers(), body).await.unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[tokio::test]
    async fn test_non_object_json_rejected() {
        let err = decode_body(&json_headers(), Bytes::from("[1,2,3]"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject));
    }

    #[tokio::test]
    async fn test_bad_file_data_rejected() {
        let body = Bytes::from(r#"{"id":"p1","files":[{"name":"a.jpg","type":"image/jpeg","data":"%%%"}]}"#);
        let err = decode_body(&json_headers(), body).await.unwrap_err();
        assert!(matches!(err, DecodeError::FileData { .. }));
    }

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_body() -> String {
        format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"payload\"\r\n\r\n\
             {{\"id\":\"p2\"}}\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"photo.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n\
             jpegdata\r\n\
             --{b}--\r\n",
            b = BOUNDARY,
        )
    }

    #[tokio::test]
    async fn test_multipart_payload_and_file() {
        let (place, files) = decode_body(&multipart_headers(BOUNDARY), Bytes::from(multipart_body()))
            .await
            .unwrap();
        assert_eq!(place.0["id"], "p2");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "photo.jpg");
        assert_eq!(files[0].content_type, "image/jpeg");
        assert_eq!(files[0].data.as_ref(), b"jpegdata");
    }

    #[tokio::test]
    async fn test_multipart_transport_base64_body() {
        let encoded = encode(multipart_body().as_bytes());
        let (place, files) = decode_body(&multipart_headers(BOUNDARY), Bytes::from(encoded))
            .await
            .unwrap();
        assert_eq!(place.0["id"], "p2");
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_multipart_flat_fields_without_payload() {
        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"id\"\r\n\r\n\
             p3\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\r\n\
             Plaza\r\n\
             --{b}--\r\n",
            b = BOUNDARY,
        );
        let (place, files) = decode_body(&multipart_headers(BOUNDARY), Bytes::from(body))
            .await
            .unwrap();
        assert_eq!(place.0["id"], "p3");
        assert_eq!(place.0["name"], "Plaza");
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_multipart_file_without_content_type_is_guessed() {
        let body = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"payload\"\r\n\r\n\
             {{\"id\":\"p4\"}}\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"cover.png\"\r\n\r\n\
             pngdata\r\n\
             --{b}--\r\n",
            b = BOUNDARY,
        );
        let (_, files) = decode_body(&multipart_headers(BOUNDARY), Bytes::from(body))
            .await
            .unwrap();
        assert_eq!(files[0].content_type, "image/png");
    }

    #[tokio::test]
    async fn test_malformed_multipart_is_an_error() {
        let err = decode_body(&multipart_headers(BOUNDARY), Bytes::from("not multipart at all"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Multipart(_)));
    }
}
