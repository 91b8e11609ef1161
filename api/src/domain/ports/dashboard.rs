//! Dashboard query port
//!
//! Each method maps to one stored procedure on the analytics database.

use async_trait::async_trait;

use crate::domain::entities::{
    AbcEntry, DashboardFilter, ForecastPoint, Granularity, InventoryLine, ReplenishmentLine,
    SalesSummary, StoreSales, TopProduct, TrendPoint,
};
use crate::error::DomainError;

#[async_trait]
pub trait DashboardQueries: Send + Sync {
    async fn sales_summary(&self, filter: &DashboardFilter) -> Result<SalesSummary, DomainError>;

    async fn sales_trend(
        &self,
        filter: &DashboardFilter,
        granularity: Granularity,
    ) -> Result<Vec<TrendPoint>, DomainError>;

    async fn top_products(
        &self,
        filter: &DashboardFilter,
        limit: i64,
    ) -> Result<Vec<TopProduct>, DomainError>;

    async fn sales_by_store(&self, filter: &DashboardFilter)
        -> Result<Vec<StoreSales>, DomainError>;

    /// Stock position as of `filter.to`, with sell rates over the filter range
    async fn inventory_status(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<InventoryLine>, DomainError>;

    async fn abc_classification(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<AbcEntry>, DomainError>;

    async fn replenishment(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<ReplenishmentLine>, DomainError>;

    /// Forecast for `horizon_days` days after `filter.to`, trained on the range
    async fn sales_forecast(
        &self,
        filter: &DashboardFilter,
        horizon_days: i64,
    ) -> Result<Vec<ForecastPoint>, DomainError>;
}
