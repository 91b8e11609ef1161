//! Subscription service
//!
//! Handles unsubscribe links from digest emails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::UnsubscribeSigner;
use crate::domain::entities::SubscriptionId;
use crate::domain::ports::SubscriptionRepository;
use crate::error::{AppError, DomainError};

#[derive(Debug, Clone, Serialize)]
pub struct UnsubscribeOutcome {
    pub subscription_id: SubscriptionId,
    pub email: String,
    pub already_unsubscribed: bool,
}

pub struct SubscriptionService<SR>
where
    SR: SubscriptionRepository,
{
    subscriptions: Arc<SR>,
    signer: UnsubscribeSigner,
}

impl<SR> SubscriptionService<SR>
where
    SR: SubscriptionRepository,
{
    pub fn new(subscriptions: Arc<SR>, signer: UnsubscribeSigner) -> Self {
        Self {
            subscriptions,
            signer,
        }
    }

    /// Deactivate the subscription a token was issued for.
    ///
    /// Repeating the call is harmless and reports `already_unsubscribed`.
    pub async fn unsubscribe(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<UnsubscribeOutcome, AppError> {
        let id = self.signer.verify(token)?;

        let subscription = self
            .subscriptions
            .find_by_id(&id)
            .await?
            .ok_or_else(|| DomainError::NotFound("This subscription no longer exists".to_string()))?;

        let changed = self.subscriptions.deactivate(&id, now).await?;
        if changed {
            tracing::info!(subscription_id = %id, "Subscription unsubscribed");
        }

        Ok(UnsubscribeOutcome {
            subscription_id: id,
            email: subscription.email,
            already_unsubscribed: !changed,
        })
    }
}
