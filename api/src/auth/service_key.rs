//! Shared-key authentication middleware
//!
//! The portal frontend and the cron scheduler each present a static bearer
//! key. Keys are compared through their SHA-256 digests so the comparison
//! does not depend on where the first differing byte is.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::AppState;

/// Extract the key from the Authorization header
fn extract_bearer(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Hash a key using SHA-256
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether `presented` matches `configured`; an unset key matches nothing
pub fn key_matches(presented: Option<&str>, configured: &str) -> bool {
    match presented {
        Some(key) if !configured.is_empty() => hash_key(key) == hash_key(configured),
        _ => false,
    }
}

/// Requires the portal key on dashboard, tenant and preview routes
pub async fn portal_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !key_matches(extract_bearer(&request), &state.config.portal_api_key) {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// Requires the cron secret on digest send routes
pub async fn cron_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !key_matches(extract_bearer(&request), &state.config.cron_secret) {
        tracing::warn!(path = %request.uri().path(), "Rejected digest send without valid cron key");
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}
