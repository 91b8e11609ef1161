//! Unsubscribe handlers
//!
//! `GET` is the link people click in the email footer. `POST` is the
//! one-click variant mail clients send for `List-Unsubscribe-Post`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::Utc;
use serde::Deserialize;

use crate::digest::pages;
use crate::error::{AppError, PageError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UnsubscribeParams {
    #[serde(default)]
    pub token: Option<String>,
}

impl UnsubscribeParams {
    fn token(&self) -> Result<&str, PageError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("The unsubscribe link is incomplete.".to_string()).into())
    }
}

/// GET /unsubscribe?token=
pub async fn unsubscribe_page(
    State(state): State<AppState>,
    Query(params): Query<UnsubscribeParams>,
) -> Result<Html<String>, PageError> {
    let outcome = state
        .subscription_service
        .unsubscribe(params.token()?, Utc::now())
        .await?;

    Ok(Html(pages::unsubscribe_page(
        &outcome.email,
        outcome.already_unsubscribed,
    )))
}

/// POST /unsubscribe?token=
pub async fn unsubscribe_one_click(
    State(state): State<AppState>,
    Query(params): Query<UnsubscribeParams>,
) -> Result<StatusCode, PageError> {
    state
        .subscription_service
        .unsubscribe(params.token()?, Utc::now())
        .await?;

    Ok(StatusCode::OK)
}
