//! Dashboard handlers
//!
//! Sales, inventory, replenishment and prediction data for one tenant. All
//! endpoints share the same filter parameters:
//! `?retailer_id=&store_id=&from=YYYY-MM-DD&to=YYYY-MM-DD`.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{FilterParams, SummaryView};
use crate::domain::entities::{
    AbcEntry, DashboardFilter, ForecastPoint, Granularity, InventoryLine, ReplenishmentLine,
    StoreSales, TenantId, TopProduct, TrendPoint,
};
use crate::error::AppError;
use crate::AppState;

/// Query parameters accepted by every dashboard endpoint
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub retailer_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Trend bucket size (`day`, `week`, `month`)
    pub granularity: Option<String>,
    /// Number of top products
    pub limit: Option<i64>,
    /// Forecast horizon in days
    pub horizon: Option<i64>,
}

impl DashboardParams {
    fn filter_params(&self) -> FilterParams {
        FilterParams {
            retailer_id: self.retailer_id,
            store_id: self.store_id,
            from: self.from,
            to: self.to,
        }
    }

    fn granularity(&self) -> Result<Granularity, AppError> {
        match &self.granularity {
            Some(g) => g.parse().map_err(AppError::BadRequest),
            None => Ok(Granularity::default()),
        }
    }
}

/// Dashboard payload: the resolved filter next to the data
#[derive(Serialize)]
pub struct DashboardResponse<T> {
    pub filter: DashboardFilter,
    pub data: T,
}

async fn resolve(
    state: &AppState,
    tenant_id: Uuid,
    params: &DashboardParams,
) -> Result<DashboardFilter, AppError> {
    state
        .dashboard_service
        .resolve_filter(
            TenantId(tenant_id),
            params.filter_params(),
            Utc::now().date_naive(),
        )
        .await
}

/// GET /tenants/:tenant_id/sales/summary
pub async fn sales_summary(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse<SummaryView>>, AppError> {
    let filter = resolve(&state, tenant_id, &params).await?;
    let data = state.dashboard_service.summary(&filter).await?;
    Ok(Json(DashboardResponse { filter, data }))
}

/// GET /tenants/:tenant_id/sales/trend
pub async fn sales_trend(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse<Vec<TrendPoint>>>, AppError> {
    let granularity = params.granularity()?;
    let filter = resolve(&state, tenant_id, &params).await?;
    let data = state.dashboard_service.trend(&filter, granularity).await?;
    Ok(Json(DashboardResponse { filter, data }))
}

/// GET /tenants/:tenant_id/sales/top-products
pub async fn top_products(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse<Vec<TopProduct>>>, AppError> {
    let filter = resolve(&state, tenant_id, &params).await?;
    let data = state
        .dashboard_service
        .top_products(&filter, params.limit)
        .await?;
    Ok(Json(DashboardResponse { filter, data }))
}

/// GET /tenants/:tenant_id/sales/by-store
pub async fn sales_by_store(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse<Vec<StoreSales>>>, AppError> {
    let filter = resolve(&state, tenant_id, &params).await?;
    let data = state.dashboard_service.by_store(&filter).await?;
    Ok(Json(DashboardResponse { filter, data }))
}

/// GET /tenants/:tenant_id/inventory/status
pub async fn inventory_status(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse<Vec<InventoryLine>>>, AppError> {
    let filter = resolve(&state, tenant_id, &params).await?;
    let data = state.dashboard_service.inventory(&filter).await?;
    Ok(Json(DashboardResponse { filter, data }))
}

/// GET /tenants/:tenant_id/inventory/abc
pub async fn abc_classification(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse<Vec<AbcEntry>>>, AppError> {
    let filter = resolve(&state, tenant_id, &params).await?;
    let data = state.dashboard_service.abc(&filter).await?;
    Ok(Json(DashboardResponse { filter, data }))
}

/// GET /tenants/:tenant_id/replenishment
pub async fn replenishment(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse<Vec<ReplenishmentLine>>>, AppError> {
    let filter = resolve(&state, tenant_id, &params).await?;
    let data = state.dashboard_service.replenishment(&filter).await?;
    Ok(Json(DashboardResponse { filter, data }))
}

/// GET /tenants/:tenant_id/predictions
pub async fn predictions(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse<Vec<ForecastPoint>>>, AppError> {
    let filter = resolve(&state, tenant_id, &params).await?;
    let data = state
        .dashboard_service
        .forecast(&filter, params.horizon)
        .await?;
    Ok(Json(DashboardResponse { filter, data }))
}
