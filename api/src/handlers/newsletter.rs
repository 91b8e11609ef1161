//! Newsletter delivery webhook
//!
//! The email provider reports delivery, bounce and complaint events here.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::app::{ConfirmOutcome, ProviderEvent};
use crate::error::AppError;
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Verify webhook signature using HMAC-SHA256
fn verify_signature(payload: &[u8], signature: Option<&str>, secret: &Option<String>) -> bool {
    let Some(secret) = secret else {
        // No secret configured, skip verification (development mode)
        tracing::warn!("Webhook secret not configured, skipping signature verification");
        return true;
    };

    let Some(sig_header) = signature else {
        tracing::warn!("No signature provided in webhook request");
        return false;
    };

    let expected_hex = sig_header.strip_prefix("sha256=").unwrap_or(sig_header);

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => {
            tracing::error!("Invalid webhook secret key");
            return false;
        }
    };

    mac.update(payload);

    let expected_bytes = match hex::decode(expected_hex) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid signature format");
            return false;
        }
    };

    mac.verify_slice(&expected_bytes).is_ok()
}

/// POST /newsletter/confirm
pub async fn confirm_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ConfirmOutcome>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok());

    if !verify_signature(&body, signature, &state.config.webhook_secret) {
        tracing::warn!("Delivery webhook signature verification failed");
        return Err(AppError::Unauthorized);
    }

    let event: ProviderEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse delivery event");
        AppError::BadRequest(format!("Invalid JSON: {}", e))
    })?;

    tracing::debug!(event_type = %event.event_type, "Received delivery event");

    let outcome = state
        .newsletter_service
        .confirm(&event, Utc::now())
        .await?;

    Ok(Json(outcome))
}
