//! Email provider client implementation
//!
//! Speaks the Resend HTTP API (`POST /emails`), which several providers
//! mirror. `NoopEmailSender` is used when no API key is configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::ports::{EmailSender, OutgoingEmail, SentEmail};
use crate::error::EmailError;

/// Implementation of the email provider client
pub struct ResendEmailClient {
    http: Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendEmailClient {
    pub fn new(base_url: String, api_key: String, from: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            from,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, EmailError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| EmailError::Deserialization(e.to_string()))
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            Err(EmailError::Unauthorized)
        } else if status.as_u16() == 429 {
            Err(EmailError::RateLimited)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(EmailError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Request types for the provider API
#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    headers: HashMap<&'static str, String>,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// RFC 2369 / RFC 8058 unsubscribe headers
fn unsubscribe_headers(url: Option<&str>) -> HashMap<&'static str, String> {
    let mut headers = HashMap::new();
    if let Some(url) = url {
        headers.insert("List-Unsubscribe", format!("<{}>", url));
        headers.insert("List-Unsubscribe-Post", "List-Unsubscribe=One-Click".to_string());
    }
    headers
}

#[async_trait]
impl EmailSender for ResendEmailClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, EmailError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: vec![email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
            headers: unsubscribe_headers(email.unsubscribe_url.as_deref()),
        };

        let response = self
            .http
            .post(self.api_url("/emails"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: SendEmailResponse = self.handle_response(response).await?;
        Ok(SentEmail {
            message_id: body.id,
        })
    }
}

/// Sender used when no provider is configured; logs instead of sending
pub struct NoopEmailSender;

#[async_trait]
impl EmailSender for NoopEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, EmailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email provider not configured, skipping send");
        Ok(SentEmail {
            message_id: format!("noop-{}", Uuid::new_v4()),
        })
    }
}
