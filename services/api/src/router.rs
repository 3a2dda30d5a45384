//! Axum Router Configuration

use crate::{state::AppState, ws::ws_handler};
use axum::{Json, Router, routing::get};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .with_state(app_state)
        .layer(cors)
}
