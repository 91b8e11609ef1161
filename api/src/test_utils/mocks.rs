//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::domain::entities::{
    AbcEntry, DashboardFilter, DigestSubscription, ForecastPoint, Granularity, InventoryLine,
    NewSendLog, ReplenishmentLine, Retailer, SalesSummary, SendLog, SendLogId, SendStatus,
    StoreSales, SubscriptionId, Tenant, TenantId, TopProduct, TrendPoint,
};
use crate::domain::ports::{
    DashboardQueries, EmailSender, OutgoingEmail, SendLogRepository, SentEmail,
    SubscriptionRepository, TenantRepository,
};
use crate::error::{DomainError, EmailError};

// ============================================================================
// In-Memory Tenant Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryTenantRepository {
    tenants: Arc<RwLock<HashMap<TenantId, Tenant>>>,
    retailers: Arc<RwLock<Vec<Retailer>>>,
}

impl InMemoryTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(self, tenant: Tenant) -> Self {
        self.tenants.write().unwrap().insert(tenant.id, tenant);
        self
    }

    pub fn with_retailer(self, retailer: Retailer) -> Self {
        self.retailers.write().unwrap().push(retailer);
        self
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError> {
        Ok(self.tenants.read().unwrap().get(id).cloned())
    }

    async fn find_active(&self) -> Result<Vec<Tenant>, DomainError> {
        let mut active: Vec<Tenant> = self
            .tenants
            .read()
            .unwrap()
            .values()
            .filter(|t| t.active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }

    async fn find_retailers(&self, tenant_ids: &[TenantId]) -> Result<Vec<Retailer>, DomainError> {
        let mut retailers: Vec<Retailer> = self
            .retailers
            .read()
            .unwrap()
            .iter()
            .filter(|r| tenant_ids.contains(&r.tenant_id))
            .cloned()
            .collect();
        retailers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(retailers)
    }
}

// ============================================================================
// In-Memory Subscription Repository
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: Arc<RwLock<HashMap<SubscriptionId, DigestSubscription>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(self, subscription: DigestSubscription) -> Self {
        self.subscriptions
            .write()
            .unwrap()
            .insert(subscription.id, subscription);
        self
    }

    /// Current stored state, for assertions
    pub fn get(&self, id: &SubscriptionId) -> Option<DigestSubscription> {
        self.subscriptions.read().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<DigestSubscription>, DomainError> {
        Ok(self.get(id))
    }

    async fn find_active(&self) -> Result<Vec<DigestSubscription>, DomainError> {
        let mut active: Vec<DigestSubscription> = self
            .subscriptions
            .read()
            .unwrap()
            .values()
            .filter(|s| s.active)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.created_at);
        Ok(active)
    }

    async fn mark_sent(&self, id: &SubscriptionId, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.write().unwrap();
        let subscription = subscriptions
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Subscription {}", id)))?;
        subscription.last_sent_at = Some(at);
        Ok(())
    }

    async fn deactivate(&self, id: &SubscriptionId, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let mut subscriptions = self.subscriptions.write().unwrap();
        match subscriptions.get_mut(id) {
            Some(subscription) if subscription.active => {
                subscription.active = false;
                subscription.unsubscribed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ============================================================================
// In-Memory Send Log Repository
// ============================================================================

#[derive(Default)]
pub struct InMemorySendLogRepository {
    logs: Arc<RwLock<Vec<SendLog>>>,
}

impl InMemorySendLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(self, log: SendLog) -> Self {
        self.logs.write().unwrap().push(log);
        self
    }

    /// All logs in insertion order
    pub fn all(&self) -> Vec<SendLog> {
        self.logs.read().unwrap().clone()
    }
}

#[async_trait]
impl SendLogRepository for InMemorySendLogRepository {
    async fn create(&self, log: &NewSendLog) -> Result<SendLog, DomainError> {
        let stored = SendLog {
            id: SendLogId::new(),
            subscription_id: log.subscription_id,
            tenant_id: log.tenant_id,
            email: log.email.clone(),
            subject: log.subject.clone(),
            status: log.status,
            provider_message_id: log.provider_message_id.clone(),
            error: log.error.clone(),
            sent_at: Utc::now(),
            delivered_at: None,
        };
        self.logs.write().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_provider_message_id(
        &self,
        message_id: &str,
    ) -> Result<Option<SendLog>, DomainError> {
        Ok(self
            .logs
            .read()
            .unwrap()
            .iter()
            .find(|l| l.provider_message_id.as_deref() == Some(message_id))
            .cloned())
    }

    async fn update_status(
        &self,
        message_id: &str,
        status: SendStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError> {
        let mut logs = self.logs.write().unwrap();
        for log in logs
            .iter_mut()
            .filter(|l| l.provider_message_id.as_deref() == Some(message_id))
        {
            log.status = status;
            if delivered_at.is_some() {
                log.delivered_at = delivered_at;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Mock Dashboard Queries
// ============================================================================

/// Returns canned results and counts calls per procedure
#[derive(Default)]
pub struct MockDashboardQueries {
    summary: SalesSummary,
    trend: Vec<TrendPoint>,
    top_products: Vec<TopProduct>,
    by_store: Vec<StoreSales>,
    inventory: Vec<InventoryLine>,
    abc: Vec<AbcEntry>,
    replenishment: Vec<ReplenishmentLine>,
    forecast: Vec<ForecastPoint>,
    calls: Arc<RwLock<HashMap<&'static str, usize>>>,
    last_top_limit: Arc<RwLock<Option<i64>>>,
    last_filter: Arc<RwLock<Option<DashboardFilter>>>,
    failing: bool,
}

impl MockDashboardQueries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(mut self, summary: SalesSummary) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_trend(mut self, trend: Vec<TrendPoint>) -> Self {
        self.trend = trend;
        self
    }

    pub fn with_top_products(mut self, products: Vec<TopProduct>) -> Self {
        self.top_products = products;
        self
    }

    pub fn with_inventory(mut self, lines: Vec<InventoryLine>) -> Self {
        self.inventory = lines;
        self
    }

    pub fn with_replenishment(mut self, lines: Vec<ReplenishmentLine>) -> Self {
        self.replenishment = lines;
        self
    }

    /// Every procedure fails as if the database were unreachable
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn call_count(&self, procedure: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .get(procedure)
            .copied()
            .unwrap_or(0)
    }

    pub fn last_top_limit(&self) -> Option<i64> {
        *self.last_top_limit.read().unwrap()
    }

    pub fn last_filter(&self) -> Option<DashboardFilter> {
        self.last_filter.read().unwrap().clone()
    }

    fn record(&self, procedure: &'static str, filter: &DashboardFilter) -> Result<(), DomainError> {
        *self.calls.write().unwrap().entry(procedure).or_insert(0) += 1;
        *self.last_filter.write().unwrap() = Some(filter.clone());
        if self.failing {
            return Err(DomainError::Database(format!("{} unavailable", procedure)));
        }
        Ok(())
    }
}

#[async_trait]
impl DashboardQueries for MockDashboardQueries {
    async fn sales_summary(&self, filter: &DashboardFilter) -> Result<SalesSummary, DomainError> {
        self.record("sales_summary", filter)?;
        Ok(self.summary.clone())
    }

    async fn sales_trend(
        &self,
        filter: &DashboardFilter,
        _granularity: Granularity,
    ) -> Result<Vec<TrendPoint>, DomainError> {
        self.record("sales_trend", filter)?;
        Ok(self.trend.clone())
    }

    async fn top_products(
        &self,
        filter: &DashboardFilter,
        limit: i64,
    ) -> Result<Vec<TopProduct>, DomainError> {
        self.record("top_products", filter)?;
        *self.last_top_limit.write().unwrap() = Some(limit);
        Ok(self
            .top_products
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn sales_by_store(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<StoreSales>, DomainError> {
        self.record("sales_by_store", filter)?;
        Ok(self.by_store.clone())
    }

    async fn inventory_status(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<InventoryLine>, DomainError> {
        self.record("inventory_status", filter)?;
        Ok(self.inventory.clone())
    }

    async fn abc_classification(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<AbcEntry>, DomainError> {
        self.record("abc_classification", filter)?;
        Ok(self.abc.clone())
    }

    async fn replenishment(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<ReplenishmentLine>, DomainError> {
        self.record("replenishment", filter)?;
        Ok(self.replenishment.clone())
    }

    async fn sales_forecast(
        &self,
        filter: &DashboardFilter,
        _horizon_days: i64,
    ) -> Result<Vec<ForecastPoint>, DomainError> {
        self.record("sales_forecast", filter)?;
        Ok(self.forecast.clone())
    }
}

// ============================================================================
// Mock Email Sender
// ============================================================================

/// Records outgoing emails; configured addresses fail with a provider error
#[derive(Default)]
pub struct MockEmailSender {
    sent: Arc<RwLock<Vec<OutgoingEmail>>>,
    failing: HashSet<String>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, email: &str) -> Self {
        self.failing.insert(email.to_string());
        self
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.read().unwrap().clone()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent().into_iter().map(|e| e.to).collect()
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, EmailError> {
        if self.failing.contains(&email.to) {
            return Err(EmailError::Api {
                status: 422,
                message: format!("Invalid recipient {}", email.to),
            });
        }
        let mut sent = self.sent.write().unwrap();
        sent.push(email.clone());
        Ok(SentEmail {
            message_id: format!("mock-{}", sent.len()),
        })
    }
}
