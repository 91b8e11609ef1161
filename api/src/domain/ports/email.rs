//! Email delivery port

use async_trait::async_trait;
use serde::Serialize;

use crate::error::EmailError;

/// A fully rendered email ready for the provider
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    /// Target for the List-Unsubscribe header
    pub unsubscribe_url: Option<String>,
}

/// Provider acknowledgement
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub message_id: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, EmailError>;
}
