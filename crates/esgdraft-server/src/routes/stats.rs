//! Health and store statistics routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::routes::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(get_stats))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "port": state.config.port,
    }))
}

/// GET /api/stats — store counters.
async fn get_stats(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.get_stats() {
        Ok(stats) => (StatusCode::OK, Json(serde_json::json!(stats))),
        Err(e) => error_response(e),
    }
}
