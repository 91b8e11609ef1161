//! PostgreSQL adapter for DashboardQueries
//!
//! Every dashboard query is a call to a set-returning stored procedure. All
//! procedures take the same leading arguments:
//! `(p_tenant uuid, p_retailer uuid, p_store uuid, p_from date, p_to date)`,
//! where a NULL retailer or store means "all".

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement, Value};
use uuid::Uuid;

use crate::domain::entities::{
    AbcClass, AbcEntry, DashboardFilter, ForecastPoint, Granularity, InventoryLine,
    ReplenishmentLine, SalesSummary, StoreSales, TopProduct, TrendPoint,
};
use crate::domain::ports::DashboardQueries;
use crate::error::DomainError;

/// PostgreSQL implementation of DashboardQueries
pub struct PostgresDashboardQueries {
    db: DatabaseConnection,
}

impl PostgresDashboardQueries {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn call<T: FromQueryResult>(
        &self,
        function: &str,
        filter: &DashboardFilter,
        extra: Vec<Value>,
    ) -> Result<Vec<T>, DomainError> {
        let (sql, values) = rpc_statement(function, filter, extra);
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, values);

        T::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(|e| {
                tracing::error!(function, error = %e, "RPC call failed");
                DomainError::Database(e.to_string())
            })
    }
}

/// Build `SELECT * FROM fn($1, ..., $n)` with the shared filter arguments first
fn rpc_statement(
    function: &str,
    filter: &DashboardFilter,
    extra: Vec<Value>,
) -> (String, Vec<Value>) {
    let mut values: Vec<Value> = vec![
        filter.tenant_id.0.into(),
        filter.retailer_id.map(|r| r.0).into(),
        filter.store_id.into(),
        filter.from.into(),
        filter.to.into(),
    ];
    values.extend(extra);

    let placeholders = (1..=values.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");

    (
        format!("SELECT * FROM {}({})", function, placeholders),
        values,
    )
}

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    units: Option<i64>,
    revenue: Option<f64>,
    store_count: Option<i64>,
    product_count: Option<i64>,
    prev_units: Option<i64>,
    prev_revenue: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct TrendRow {
    bucket: NaiveDate,
    units: Option<i64>,
    revenue: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct TopProductRow {
    product_id: Uuid,
    product_name: String,
    ean: String,
    units: Option<i64>,
    revenue: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct StoreSalesRow {
    store_id: Uuid,
    store_name: String,
    units: Option<i64>,
    revenue: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct InventoryRow {
    store_id: Uuid,
    store_name: String,
    product_id: Uuid,
    product_name: String,
    stock_units: Option<i64>,
    avg_daily_units: Option<f64>,
    days_of_cover: Option<f64>,
    out_of_stock: Option<bool>,
}

#[derive(Debug, FromQueryResult)]
struct AbcRow {
    product_id: Uuid,
    product_name: String,
    revenue: Option<f64>,
    cumulative_share: Option<f64>,
    abc_class: String,
}

#[derive(Debug, FromQueryResult)]
struct ReplenishmentRow {
    store_id: Uuid,
    store_name: String,
    product_id: Uuid,
    product_name: String,
    stock_units: Option<i64>,
    avg_daily_units: Option<f64>,
    suggested_units: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct ForecastRow {
    date: NaiveDate,
    predicted_units: Option<f64>,
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
}

#[async_trait]
impl DashboardQueries for PostgresDashboardQueries {
    async fn sales_summary(&self, filter: &DashboardFilter) -> Result<SalesSummary, DomainError> {
        let rows: Vec<SummaryRow> = self.call("get_sales_summary", filter, vec![]).await?;

        Ok(rows
            .into_iter()
            .next()
            .map(|r| SalesSummary {
                units: r.units.unwrap_or(0),
                revenue: r.revenue.unwrap_or(0.0),
                store_count: r.store_count.unwrap_or(0),
                product_count: r.product_count.unwrap_or(0),
                prev_units: r.prev_units.unwrap_or(0),
                prev_revenue: r.prev_revenue.unwrap_or(0.0),
            })
            .unwrap_or_default())
    }

    async fn sales_trend(
        &self,
        filter: &DashboardFilter,
        granularity: Granularity,
    ) -> Result<Vec<TrendPoint>, DomainError> {
        let rows: Vec<TrendRow> = self
            .call(
                "get_sales_trend",
                filter,
                vec![granularity.to_string().into()],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| TrendPoint {
                bucket: r.bucket,
                units: r.units.unwrap_or(0),
                revenue: r.revenue.unwrap_or(0.0),
            })
            .collect())
    }

    async fn top_products(
        &self,
        filter: &DashboardFilter,
        limit: i64,
    ) -> Result<Vec<TopProduct>, DomainError> {
        let rows: Vec<TopProductRow> = self
            .call("get_top_products", filter, vec![limit.into()])
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| TopProduct {
                product_id: r.product_id,
                product_name: r.product_name,
                ean: r.ean,
                units: r.units.unwrap_or(0),
                revenue: r.revenue.unwrap_or(0.0),
            })
            .collect())
    }

    async fn sales_by_store(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<StoreSales>, DomainError> {
        let rows: Vec<StoreSalesRow> = self.call("get_sales_by_store", filter, vec![]).await?;

        Ok(rows
            .into_iter()
            .map(|r| StoreSales {
                store_id: r.store_id,
                store_name: r.store_name,
                units: r.units.unwrap_or(0),
                revenue: r.revenue.unwrap_or(0.0),
            })
            .collect())
    }

    async fn inventory_status(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<InventoryLine>, DomainError> {
        let rows: Vec<InventoryRow> = self.call("get_inventory_status", filter, vec![]).await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let stock_units = r.stock_units.unwrap_or(0);
                InventoryLine {
                    store_id: r.store_id,
                    store_name: r.store_name,
                    product_id: r.product_id,
                    product_name: r.product_name,
                    stock_units,
                    avg_daily_units: r.avg_daily_units.unwrap_or(0.0),
                    days_of_cover: r.days_of_cover,
                    out_of_stock: r.out_of_stock.unwrap_or(stock_units <= 0),
                }
            })
            .collect())
    }

    async fn abc_classification(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<AbcEntry>, DomainError> {
        let rows: Vec<AbcRow> = self
            .call("get_abc_classification", filter, vec![])
            .await?;

        rows.into_iter()
            .map(|r| {
                let class: AbcClass = r.abc_class.parse().map_err(DomainError::Internal)?;
                Ok(AbcEntry {
                    product_id: r.product_id,
                    product_name: r.product_name,
                    revenue: r.revenue.unwrap_or(0.0),
                    cumulative_share: r.cumulative_share.unwrap_or(0.0),
                    class,
                })
            })
            .collect()
    }

    async fn replenishment(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<ReplenishmentLine>, DomainError> {
        let rows: Vec<ReplenishmentRow> = self.call("get_replenishment", filter, vec![]).await?;

        Ok(rows
            .into_iter()
            .map(|r| ReplenishmentLine {
                store_id: r.store_id,
                store_name: r.store_name,
                product_id: r.product_id,
                product_name: r.product_name,
                stock_units: r.stock_units.unwrap_or(0),
                avg_daily_units: r.avg_daily_units.unwrap_or(0.0),
                suggested_units: r.suggested_units.unwrap_or(0),
            })
            .collect())
    }

    async fn sales_forecast(
        &self,
        filter: &DashboardFilter,
        horizon_days: i64,
    ) -> Result<Vec<ForecastPoint>, DomainError> {
        let rows: Vec<ForecastRow> = self
            .call("get_sales_forecast", filter, vec![horizon_days.into()])
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let predicted = r.predicted_units.unwrap_or(0.0);
                ForecastPoint {
                    date: r.date,
                    predicted_units: predicted,
                    lower: r.lower_bound.unwrap_or(predicted),
                    upper: r.upper_bound.unwrap_or(predicted),
                }
            })
            .collect())
    }
}
