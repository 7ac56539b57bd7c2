//! Key Handlers
//!
//! Submission and lookup of SSH keys.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, Method, Uri},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use inki_core::Key;

use crate::api::error::ApiError;
use crate::api::handlers::AppState;
use crate::keys::KeyPredicate;

/// List every registered key
///
/// GET /api/v1/keys
pub async fn list_keys(State(state): State<Arc<AppState>>) -> Json<Vec<Key>> {
    Json(state.registry.all())
}

/// Submit one or more signed keys
///
/// POST /api/v1/keys
///
/// The body is a stream of signed envelopes, each carrying one key. Either
/// every key is accepted or none are.
pub async fn add_keys(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Vec<Key>>, ApiError> {
    let accepted = state.pipeline.submit(&body).await?;
    Ok(Json(accepted))
}

/// List the keys registered for a user
///
/// GET /api/v1/user/{user}/keys
pub async fn user_keys(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Json<Vec<Key>> {
    Json(state.registry.query(&KeyPredicate::user_equals(user)))
}

/// Currently valid keys for a user in `authorized_keys` format
///
/// GET /api/v1/user/{user}/authorized_keys
pub async fn authorized_keys(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> impl IntoResponse {
    let now = Utc::now();
    let query = KeyPredicate::user_equals(user.as_str()).and(KeyPredicate::NotExpired);

    let mut body = String::new();
    for key in state.registry.query_at(&query, now) {
        if key.validate_at(now).is_ok() {
            body.push_str(key.authorized_key_line());
            body.push('\n');
        }
    }

    debug!(user = %user, bytes = body.len(), "Served authorized keys");
    ([(header::CONTENT_TYPE, "text/plain")], body)
}

/// Fetch one of a user's keys by fingerprint
///
/// GET /api/v1/user/{user}/key/{fingerprint}
pub async fn user_key(
    State(state): State<Arc<AppState>>,
    Path((user, fingerprint)): Path<(String, String)>,
) -> Result<Json<Key>, ApiError> {
    let query = KeyPredicate::user_equals(user.as_str())
        .and(KeyPredicate::fingerprint_equals(fingerprint.as_str()));

    state
        .registry
        .query_one(&query)
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No key with fingerprint '{}' for user '{}'",
                fingerprint, user
            ))
        })
}

/// Fallback for unknown routes
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    info!(method = %method, uri = %uri, "Route not found");
    ApiError::NotFound(format!("No route for {} {}", method, uri.path()))
}
