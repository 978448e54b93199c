//! Handlers for the place-collection resource. Each request runs one
//! sequential read-modify-write cycle: decode → load → ingest media → save.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use crate::decode;
use crate::ingest;
use crate::state::AppState;

fn error_json(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn ok_or_internal(action: &str, result: anyhow::Result<()>) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "ok": true }))).into_response(),
        Err(e) => {
            warn!(error = %e, action, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_json(&e.to_string())),
            )
                .into_response()
        }
    }
}

// ── GET /api/places ──

/// Return the stored document verbatim when it parses as JSON; anything
/// unusable (missing, empty, unreachable, corrupt) degrades to the literal
/// empty array.
pub async fn get_places(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = match state.store.fetch_document().await {
        Some(text) if serde_json::from_str::<serde_json::Value>(&text).is_ok() => text,
        _ => "[]".to_string(),
    };
    ([(header::CONTENT_TYPE, "application/json")], body)
}

// ── POST /api/places ──

pub async fn create_place(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    ok_or_internal("create", append_place(&state, &headers, body).await)
}

async fn append_place(state: &AppState, headers: &HeaderMap, body: Bytes) -> anyhow::Result<()> {
    let (mut place, files) = decode::decode_body(headers, body).await?;
    let mut places = state.store.load().await;
    ingest::ingest_media(state.store.as_ref(), &state.media_dir, &mut place, files).await?;

    let message = format!(
        "add place {}",
        place.id_label().unwrap_or_else(|| "new".into())
    );
    places.push(place);
    state.store.save(&places, &message).await?;
    Ok(())
}

// ── PUT /api/places (local backend only) ──

pub async fn update_place(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    ok_or_internal("update", replace_place(&state, &headers, body).await)
}

async fn replace_place(state: &AppState, headers: &HeaderMap, body: Bytes) -> anyhow::Result<()> {
    let (mut place, files) = decode::decode_body(headers, body).await?;
    let mut places = state.store.load().await;
    ingest::ingest_media(state.store.as_ref(), &state.media_dir, &mut place, files).await?;

    let message = format!(
        "update place {}",
        place.id_label().unwrap_or_else(|| "unknown".into())
    );
    // No matching record leaves the collection unchanged; the caller still
    // gets ok.
    if let Some(id) = place.id().cloned() {
        if let Some(slot) = places.iter_mut().find(|p| p.matches_id(&id)) {
            *slot = place;
        }
    }
    state.store.save(&places, &message).await?;
    Ok(())
}

// ── DELETE /api/places (local backend only) ──

pub async fn delete_place(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    ok_or_internal("delete", remove_place(&state, &headers, body).await)
}

async fn remove_place(state: &AppState, headers: &HeaderMap, body: Bytes) -> anyhow::Result<()> {
    let (place, _files) = decode::decode_body(headers, body).await?;
    let mut places = state.store.load().await;

    if let Some(id) = place.id() {
        places.retain(|p| !p.matches_id(id));
    }

    let message = format!(
        "remove place {}",
        place.id_label().unwrap_or_else(|| "unknown".into())
    );
    state.store.save(&places, &message).await?;
    Ok(())
}
