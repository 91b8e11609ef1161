//! Newsletter send log entity
//!
//! One row per digest email handed to the provider, updated later by
//! delivery webhooks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::subscription::SubscriptionId;
use super::tenant::TenantId;

/// Unique identifier for a send log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SendLogId(pub Uuid);

impl SendLogId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SendLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SendLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery state of a digest email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Sent,
    Failed,
    Delivered,
    Bounced,
    Complained,
}

impl std::fmt::Display for SendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendStatus::Sent => write!(f, "sent"),
            SendStatus::Failed => write!(f, "failed"),
            SendStatus::Delivered => write!(f, "delivered"),
            SendStatus::Bounced => write!(f, "bounced"),
            SendStatus::Complained => write!(f, "complained"),
        }
    }
}

impl std::str::FromStr for SendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sent" => Ok(SendStatus::Sent),
            "failed" => Ok(SendStatus::Failed),
            "delivered" => Ok(SendStatus::Delivered),
            "bounced" => Ok(SendStatus::Bounced),
            "complained" => Ok(SendStatus::Complained),
            _ => Err(format!("Unknown send status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendLog {
    pub id: SendLogId,
    pub subscription_id: SubscriptionId,
    pub tenant_id: TenantId,
    pub email: String,
    pub subject: String,
    pub status: SendStatus,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Data needed to record a send attempt
#[derive(Debug, Clone)]
pub struct NewSendLog {
    pub subscription_id: SubscriptionId,
    pub tenant_id: TenantId,
    pub email: String,
    pub subject: String,
    pub status: SendStatus,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
}
