//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{
    DigestSubscription, NewSendLog, Retailer, SendLog, SendStatus, SubscriptionId, Tenant,
    TenantId,
};
use crate::error::DomainError;

/// Repository for tenants and their retailers
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Find a tenant by ID
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError>;

    /// List active tenants ordered by name
    async fn find_active(&self) -> Result<Vec<Tenant>, DomainError>;

    /// List retailers belonging to the given tenants
    async fn find_retailers(&self, tenant_ids: &[TenantId]) -> Result<Vec<Retailer>, DomainError>;
}

/// Repository for digest subscriptions
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: &SubscriptionId)
        -> Result<Option<DigestSubscription>, DomainError>;

    /// List all active subscriptions
    async fn find_active(&self) -> Result<Vec<DigestSubscription>, DomainError>;

    /// Stamp the time of the last successful send
    async fn mark_sent(&self, id: &SubscriptionId, at: DateTime<Utc>) -> Result<(), DomainError>;

    /// Deactivate a subscription; returns false if it was already inactive
    async fn deactivate(&self, id: &SubscriptionId, at: DateTime<Utc>)
        -> Result<bool, DomainError>;
}

/// Repository for newsletter send logs
#[async_trait]
pub trait SendLogRepository: Send + Sync {
    /// Record a send attempt
    async fn create(&self, log: &NewSendLog) -> Result<SendLog, DomainError>;

    /// Find the log for a provider message id
    async fn find_by_provider_message_id(
        &self,
        message_id: &str,
    ) -> Result<Option<SendLog>, DomainError>;

    /// Update delivery status; `delivered_at` is only set for deliveries
    async fn update_status(
        &self,
        message_id: &str,
        status: SendStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError>;
}
