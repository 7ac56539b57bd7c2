//! API module for the Inki server

pub mod error;
pub mod handlers;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use handlers::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/keys",
            get(handlers::list_keys).post(handlers::add_keys),
        )
        .route("/api/v1/user/{user}/keys", get(handlers::user_keys))
        .route(
            "/api/v1/user/{user}/authorized_keys",
            get(handlers::authorized_keys),
        )
        .route(
            "/api/v1/user/{user}/key/{fingerprint}",
            get(handlers::user_key),
        )
        .fallback(handlers::not_found)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
