//! HTTP route handlers.

pub mod chat;
pub mod report;
pub mod stats;
pub mod template;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use esgdraft_core::Error;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(stats::routes())
        .merge(report::routes())
        .merge(template::routes())
        .merge(chat::routes())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "esgdraft backend is running",
        "status": "healthy",
    }))
}

/// Map a pipeline error to an HTTP status with a JSON error payload.
pub(crate) fn error_response(error: Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &error {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Llm(_) => StatusCode::BAD_GATEWAY,
        Error::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": error.to_string() })))
}
