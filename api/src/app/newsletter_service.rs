//! Newsletter delivery confirmation
//!
//! Applies delivery events from the email provider to the send logs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::SendStatus;
use crate::domain::ports::{SendLogRepository, SubscriptionRepository};
use crate::error::AppError;

/// Webhook payload sent by the email provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: ProviderEventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderEventData {
    #[serde(default)]
    pub email_id: Option<String>,
}

/// Event types that change a send log
fn status_for(event_type: &str) -> Option<SendStatus> {
    match event_type {
        "email.delivered" => Some(SendStatus::Delivered),
        "email.bounced" => Some(SendStatus::Bounced),
        "email.complained" => Some(SendStatus::Complained),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmOutcome {
    pub received: bool,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SendStatus>,
}

impl ConfirmOutcome {
    fn ignored() -> Self {
        Self {
            received: true,
            updated: false,
            status: None,
        }
    }
}

pub struct NewsletterService<LR, SR>
where
    LR: SendLogRepository,
    SR: SubscriptionRepository,
{
    send_logs: Arc<LR>,
    subscriptions: Arc<SR>,
}

impl<LR, SR> NewsletterService<LR, SR>
where
    LR: SendLogRepository,
    SR: SubscriptionRepository,
{
    pub fn new(send_logs: Arc<LR>, subscriptions: Arc<SR>) -> Self {
        Self {
            send_logs,
            subscriptions,
        }
    }

    /// Apply one provider event
    pub async fn confirm(
        &self,
        event: &ProviderEvent,
        now: DateTime<Utc>,
    ) -> Result<ConfirmOutcome, AppError> {
        let Some(status) = status_for(&event.event_type) else {
            tracing::debug!(event_type = %event.event_type, "Ignoring provider event");
            return Ok(ConfirmOutcome::ignored());
        };

        let message_id = event
            .data
            .email_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::BadRequest("data.email_id is required".to_string()))?;

        let Some(log) = self.send_logs.find_by_provider_message_id(message_id).await? else {
            tracing::info!(message_id, "Delivery event for unknown message");
            return Ok(ConfirmOutcome::ignored());
        };

        // A late delivery receipt must not hide an earlier bounce or complaint
        if status == SendStatus::Delivered
            && matches!(log.status, SendStatus::Bounced | SendStatus::Complained)
        {
            return Ok(ConfirmOutcome {
                received: true,
                updated: false,
                status: Some(log.status),
            });
        }

        let delivered_at = match status {
            SendStatus::Delivered => Some(event.created_at.unwrap_or(now)),
            _ => None,
        };
        self.send_logs
            .update_status(message_id, status, delivered_at)
            .await?;

        if status == SendStatus::Complained {
            let deactivated = self
                .subscriptions
                .deactivate(&log.subscription_id, now)
                .await?;
            tracing::info!(
                subscription_id = %log.subscription_id,
                deactivated,
                "Spam complaint received, subscription stopped"
            );
        }

        tracing::info!(message_id, status = %status, "Send log updated");

        Ok(ConfirmOutcome {
            received: true,
            updated: true,
            status: Some(status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DigestFrequency;
    use crate::test_utils::{
        test_send_log, test_subscription, test_tenant, InMemorySendLogRepository,
        InMemorySubscriptionRepository,
    };

    fn event(event_type: &str, email_id: Option<&str>) -> ProviderEvent {
        ProviderEvent {
            event_type: event_type.to_string(),
            created_at: None,
            data: ProviderEventData {
                email_id: email_id.map(String::from),
            },
        }
    }

    #[test]
    fn parses_provider_payload() {
        let payload = r#"{
            "type": "email.delivered",
            "created_at": "2024-03-11T06:01:02Z",
            "data": {"email_id": "msg-1", "to": ["buyer@example.com"]}
        }"#;

        let event: ProviderEvent = serde_json::from_str(payload).unwrap();

        assert_eq!(event.event_type, "email.delivered");
        assert_eq!(event.data.email_id.as_deref(), Some("msg-1"));
        assert!(event.created_at.is_some());
    }

    #[tokio::test]
    async fn delivered_updates_log() {
        let tenant = test_tenant();
        let sub = test_subscription(&tenant, DigestFrequency::Weekly);
        let logs = Arc::new(InMemorySendLogRepository::new().with_log(test_send_log(&sub, "msg-1")));
        let subs = Arc::new(InMemorySubscriptionRepository::new().with_subscription(sub));
        let service = NewsletterService::new(logs.clone(), subs);

        let now = Utc::now();
        let outcome = service
            .confirm(&event("email.delivered", Some("msg-1")), now)
            .await
            .unwrap();

        assert!(outcome.updated);
        let log = logs.all().pop().unwrap();
        assert_eq!(log.status, SendStatus::Delivered);
        assert_eq!(log.delivered_at, Some(now));
    }

    #[tokio::test]
    async fn complaint_deactivates_subscription() {
        let tenant = test_tenant();
        let sub = test_subscription(&tenant, DigestFrequency::Weekly);
        let logs = Arc::new(InMemorySendLogRepository::new().with_log(test_send_log(&sub, "msg-2")));
        let subs = Arc::new(InMemorySubscriptionRepository::new().with_subscription(sub.clone()));
        let service = NewsletterService::new(logs.clone(), subs.clone());

        service
            .confirm(&event("email.complained", Some("msg-2")), Utc::now())
            .await
            .unwrap();

        assert_eq!(logs.all()[0].status, SendStatus::Complained);
        assert!(!subs.get(&sub.id).unwrap().active);
    }

    #[tokio::test]
    async fn late_delivery_keeps_bounce() {
        let tenant = test_tenant();
        let sub = test_subscription(&tenant, DigestFrequency::Daily);
        let mut log = test_send_log(&sub, "msg-3");
        log.status = SendStatus::Bounced;
        let logs = Arc::new(InMemorySendLogRepository::new().with_log(log));
        let subs = Arc::new(InMemorySubscriptionRepository::new().with_subscription(sub));
        let service = NewsletterService::new(logs.clone(), subs);

        let outcome = service
            .confirm(&event("email.delivered", Some("msg-3")), Utc::now())
            .await
            .unwrap();

        assert!(!outcome.updated);
        assert_eq!(logs.all()[0].status, SendStatus::Bounced);
    }

    #[tokio::test]
    async fn unknown_message_is_acknowledged() {
        let service = NewsletterService::new(
            Arc::new(InMemorySendLogRepository::new()),
            Arc::new(InMemorySubscriptionRepository::new()),
        );

        let outcome = service
            .confirm(&event("email.bounced", Some("nope")), Utc::now())
            .await
            .unwrap();

        assert!(outcome.received);
        assert!(!outcome.updated);
    }

    #[tokio::test]
    async fn unknown_event_type_is_ignored() {
        let service = NewsletterService::new(
            Arc::new(InMemorySendLogRepository::new()),
            Arc::new(InMemorySubscriptionRepository::new()),
        );

        let outcome = service
            .confirm(&event("email.opened", None), Utc::now())
            .await
            .unwrap();

        assert!(!outcome.updated);
    }

    #[tokio::test]
    async fn missing_message_id_is_rejected() {
        let service = NewsletterService::new(
            Arc::new(InMemorySendLogRepository::new()),
            Arc::new(InMemorySubscriptionRepository::new()),
        );

        let result = service
            .confirm(&event("email.delivered", None), Utc::now())
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
