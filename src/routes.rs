use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::handlers::{places, system};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let mut collection = get(places::get_places).post(places::create_place);
    if state.local_mutations() {
        collection = collection
            .put(places::update_place)
            .delete(places::delete_place);
    }

    Router::new()
        .route("/api/places", collection.fallback(method_not_allowed))
        .route("/api/health", get(system::health))
        .with_state(state)
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}
