//! Dashboard service
//!
//! Validates dashboard filters and fronts the analytics procedures with a
//! TTL cache, so repeated chart loads within a few minutes do not re-run the
//! aggregation on the database.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::domain::entities::{
    AbcEntry, DashboardFilter, ForecastPoint, Granularity, InventoryLine, ReplenishmentLine,
    RetailerId, SalesSummary, StoreSales, TenantId, TopProduct, TrendPoint, MAX_RANGE_DAYS,
};
use crate::domain::ports::{DashboardQueries, TenantRepository};
use crate::error::{AppError, DomainError};

pub const DEFAULT_TOP_LIMIT: i64 = 10;
pub const MAX_TOP_LIMIT: i64 = 100;
pub const DEFAULT_HORIZON_DAYS: i64 = 28;
pub const MAX_HORIZON_DAYS: i64 = 90;

/// Raw filter parameters as received from the caller
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub retailer_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Sales summary with the period-over-period changes filled in
#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    #[serde(flatten)]
    pub summary: SalesSummary,
    pub units_change_pct: Option<f64>,
    pub revenue_change_pct: Option<f64>,
}

impl From<SalesSummary> for SummaryView {
    fn from(summary: SalesSummary) -> Self {
        Self {
            units_change_pct: summary.units_change_pct(),
            revenue_change_pct: summary.revenue_change_pct(),
            summary,
        }
    }
}

/// Service for dashboard data
pub struct DashboardService<Q, TR>
where
    Q: DashboardQueries,
    TR: TenantRepository,
{
    queries: Arc<Q>,
    tenants: Arc<TR>,
    cache: Cache<String, serde_json::Value>,
}

impl<Q, TR> DashboardService<Q, TR>
where
    Q: DashboardQueries,
    TR: TenantRepository,
{
    pub fn new(queries: Arc<Q>, tenants: Arc<TR>, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self {
            queries,
            tenants,
            cache,
        }
    }

    /// Turn request parameters into a validated filter for an active tenant
    pub async fn resolve_filter(
        &self,
        tenant_id: TenantId,
        params: FilterParams,
        today: NaiveDate,
    ) -> Result<DashboardFilter, AppError> {
        let tenant = self
            .tenants
            .find_by_id(&tenant_id)
            .await?
            .filter(|t| t.active)
            .ok_or_else(|| DomainError::NotFound(format!("Tenant {}", tenant_id)))?;

        let filter = DashboardFilter::with_defaults(
            tenant.id,
            params.retailer_id.map(RetailerId),
            params.store_id,
            params.from,
            params.to,
            today,
        )?;
        validate_range(&filter)?;

        Ok(filter)
    }

    pub async fn summary(&self, filter: &DashboardFilter) -> Result<SummaryView, AppError> {
        let summary: SalesSummary = self
            .cached(cache_key("summary", filter, ""), || {
                self.queries.sales_summary(filter)
            })
            .await?;
        Ok(summary.into())
    }

    pub async fn trend(
        &self,
        filter: &DashboardFilter,
        granularity: Granularity,
    ) -> Result<Vec<TrendPoint>, AppError> {
        self.cached(
            cache_key("trend", filter, &granularity.to_string()),
            || self.queries.sales_trend(filter, granularity),
        )
        .await
    }

    pub async fn top_products(
        &self,
        filter: &DashboardFilter,
        limit: Option<i64>,
    ) -> Result<Vec<TopProduct>, AppError> {
        let limit = clamp_or_default(limit, DEFAULT_TOP_LIMIT, MAX_TOP_LIMIT);
        self.cached(cache_key("top", filter, &limit.to_string()), || {
            self.queries.top_products(filter, limit)
        })
        .await
    }

    pub async fn by_store(&self, filter: &DashboardFilter) -> Result<Vec<StoreSales>, AppError> {
        self.cached(cache_key("stores", filter, ""), || {
            self.queries.sales_by_store(filter)
        })
        .await
    }

    pub async fn inventory(&self, filter: &DashboardFilter) -> Result<Vec<InventoryLine>, AppError> {
        self.cached(cache_key("inventory", filter, ""), || {
            self.queries.inventory_status(filter)
        })
        .await
    }

    pub async fn abc(&self, filter: &DashboardFilter) -> Result<Vec<AbcEntry>, AppError> {
        self.cached(cache_key("abc", filter, ""), || {
            self.queries.abc_classification(filter)
        })
        .await
    }

    pub async fn replenishment(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<ReplenishmentLine>, AppError> {
        self.cached(cache_key("replenishment", filter, ""), || {
            self.queries.replenishment(filter)
        })
        .await
    }

    pub async fn forecast(
        &self,
        filter: &DashboardFilter,
        horizon_days: Option<i64>,
    ) -> Result<Vec<ForecastPoint>, AppError> {
        let horizon = clamp_or_default(horizon_days, DEFAULT_HORIZON_DAYS, MAX_HORIZON_DAYS);
        self.cached(cache_key("forecast", filter, &horizon.to_string()), || {
            self.queries.sales_forecast(filter, horizon)
        })
        .await
    }

    async fn cached<T, F, Fut>(&self, key: String, fetch: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        if let Some(hit) = self.cache.get(&key).await {
            match serde_json::from_value(hit) {
                Ok(value) => return Ok(value),
                Err(e) => tracing::warn!(error = %e, key = %key, "Discarding unreadable cache entry"),
            }
        }

        let value = fetch().await?;
        match serde_json::to_value(&value) {
            Ok(json) => self.cache.insert(key, json).await,
            Err(e) => tracing::warn!(error = %e, "Dashboard result not cacheable"),
        }

        Ok(value)
    }
}

fn cache_key(operation: &str, filter: &DashboardFilter, extra: &str) -> String {
    format!("{}:{}:{}", operation, filter.cache_key(), extra)
}

fn validate_range(filter: &DashboardFilter) -> Result<(), DomainError> {
    if filter.from > filter.to {
        return Err(DomainError::Validation(format!(
            "from ({}) must not be after to ({})",
            filter.from, filter.to
        )));
    }
    if filter.span_days() > MAX_RANGE_DAYS {
        return Err(DomainError::Validation(format!(
            "date range spans {} days, the maximum is {}",
            filter.span_days(),
            MAX_RANGE_DAYS
        )));
    }
    Ok(())
}

fn clamp_or_default(value: Option<i64>, default: i64, max: i64) -> i64 {
    value.unwrap_or(default).clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_summary, test_tenant, InMemoryTenantRepository, MockDashboardQueries};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn service(
        queries: Arc<MockDashboardQueries>,
        tenants: InMemoryTenantRepository,
    ) -> DashboardService<MockDashboardQueries, InMemoryTenantRepository> {
        DashboardService::new(queries, Arc::new(tenants), Duration::from_secs(60), 100)
    }

    #[tokio::test]
    async fn resolve_filter_applies_defaults() {
        let tenant = test_tenant();
        let svc = service(
            Arc::new(MockDashboardQueries::new()),
            InMemoryTenantRepository::new().with_tenant(tenant.clone()),
        );

        let filter = svc
            .resolve_filter(tenant.id, FilterParams::default(), today())
            .await
            .unwrap();

        assert_eq!(filter.to, NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
        assert_eq!(filter.span_days(), 30);
    }

    #[tokio::test]
    async fn resolve_filter_rejects_inverted_range() {
        let tenant = test_tenant();
        let svc = service(
            Arc::new(MockDashboardQueries::new()),
            InMemoryTenantRepository::new().with_tenant(tenant.clone()),
        );

        let params = FilterParams {
            from: NaiveDate::from_ymd_opt(2024, 5, 10),
            to: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        let result = svc.resolve_filter(tenant.id, params, today()).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn resolve_filter_rejects_oversized_range() {
        let tenant = test_tenant();
        let svc = service(
            Arc::new(MockDashboardQueries::new()),
            InMemoryTenantRepository::new().with_tenant(tenant.clone()),
        );

        let params = FilterParams {
            from: NaiveDate::from_ymd_opt(2020, 1, 1),
            to: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        let result = svc.resolve_filter(tenant.id, params, today()).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn resolve_filter_requires_active_tenant() {
        let mut tenant = test_tenant();
        tenant.active = false;
        let svc = service(
            Arc::new(MockDashboardQueries::new()),
            InMemoryTenantRepository::new().with_tenant(tenant.clone()),
        );

        let result = svc
            .resolve_filter(tenant.id, FilterParams::default(), today())
            .await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn summary_is_cached_per_filter() {
        let tenant = test_tenant();
        let queries = Arc::new(MockDashboardQueries::new().with_summary(test_summary()));
        let svc = service(
            queries.clone(),
            InMemoryTenantRepository::new().with_tenant(tenant.clone()),
        );
        let filter = svc
            .resolve_filter(tenant.id, FilterParams::default(), today())
            .await
            .unwrap();

        let first = svc.summary(&filter).await.unwrap();
        let second = svc.summary(&filter).await.unwrap();

        assert_eq!(first.summary, second.summary);
        assert_eq!(queries.call_count("sales_summary"), 1);
        assert_eq!(first.units_change_pct, Some(25.0));
    }

    #[tokio::test]
    async fn different_limits_are_cached_separately() {
        let tenant = test_tenant();
        let queries = Arc::new(MockDashboardQueries::new());
        let svc = service(
            queries.clone(),
            InMemoryTenantRepository::new().with_tenant(tenant.clone()),
        );
        let filter = svc
            .resolve_filter(tenant.id, FilterParams::default(), today())
            .await
            .unwrap();

        svc.top_products(&filter, Some(5)).await.unwrap();
        svc.top_products(&filter, Some(500)).await.unwrap();
        svc.top_products(&filter, Some(100)).await.unwrap();

        // 500 is clamped to 100, so the third call is a cache hit
        assert_eq!(queries.call_count("top_products"), 2);
    }

    #[tokio::test]
    async fn resolve_filter_rejects_to_at_earliest_date() {
        let tenant = test_tenant();
        let svc = service(
            Arc::new(MockDashboardQueries::new()),
            InMemoryTenantRepository::new().with_tenant(tenant.clone()),
        );

        let params = FilterParams {
            to: Some(NaiveDate::MIN),
            ..Default::default()
        };
        let result = svc.resolve_filter(tenant.id, params, today()).await;

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
    }

    #[test]
    fn range_limit_is_inclusive() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let filter = |to: NaiveDate| DashboardFilter {
            tenant_id: test_tenant().id,
            retailer_id: None,
            store_id: None,
            from,
            to,
        };

        let widest = filter(from + chrono::Duration::days(MAX_RANGE_DAYS - 1));
        assert_eq!(widest.span_days(), 731);
        assert!(validate_range(&widest).is_ok());

        let too_wide = filter(from + chrono::Duration::days(MAX_RANGE_DAYS));
        assert_eq!(too_wide.span_days(), 732);
        assert!(matches!(
            validate_range(&too_wide),
            Err(DomainError::Validation(_))
        ));

        assert!(validate_range(&filter(from)).is_ok());
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_or_default(None, 10, 100), 10);
        assert_eq!(clamp_or_default(Some(0), 10, 100), 1);
        assert_eq!(clamp_or_default(Some(-5), 10, 100), 1);
        assert_eq!(clamp_or_default(Some(250), 10, 100), 100);
    }
}
