use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::config::BackendKind;
use crate::state::AppState;

// ── GET /api/health ──

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let backend = match state.backend {
        BackendKind::Github => "github",
        BackendKind::Local => "local",
    };
    Json(serde_json::json!({
        "status": "ok",
        "backend": backend,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
