//! Digest handlers
//!
//! Preview for the portal and send triggers for the scheduler.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::{DeliveryOutcome, SendReport};
use crate::domain::entities::SubscriptionId;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub subscription_id: Uuid,
    /// `html` (default), `text` or `json`
    #[serde(default)]
    pub format: Option<String>,
}

/// GET /digest/preview?subscription_id=&format=html|text|json
pub async fn preview_digest(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> Result<Response, AppError> {
    let rendered = state
        .digest_service
        .preview(&SubscriptionId(params.subscription_id), Utc::now())
        .await?;

    match params.format.as_deref().unwrap_or("html") {
        "html" => Ok(Html(rendered.html).into_response()),
        "text" => Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            rendered.text,
        )
            .into_response()),
        "json" => Ok(Json(rendered).into_response()),
        other => Err(AppError::BadRequest(format!(
            "Unknown format '{}', expected html, text or json",
            other
        ))),
    }
}

/// POST /digest/send
///
/// Called by the external scheduler; sends every digest that is due.
pub async fn send_due_digests(
    State(state): State<AppState>,
) -> Result<Json<SendReport>, AppError> {
    let report = state.digest_service.send_due(Utc::now()).await?;
    Ok(Json(report))
}

/// POST /digest/send/:subscription_id
pub async fn send_digest(
    State(state): State<AppState>,
    Path(subscription_id): Path<Uuid>,
) -> Result<Json<DeliveryOutcome>, AppError> {
    let outcome = state
        .digest_service
        .send_one(&SubscriptionId(subscription_id), Utc::now())
        .await?;
    Ok(Json(outcome))
}
