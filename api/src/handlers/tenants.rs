//! Tenant handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::domain::entities::{TenantId, TenantWithRetailers};
use crate::error::AppError;
use crate::AppState;

/// GET /tenants
///
/// Active tenants with their retailers, for the portal's tenant switcher.
pub async fn list_tenants(
    State(state): State<AppState>,
) -> Result<Json<Vec<TenantWithRetailers>>, AppError> {
    let tenants = state.tenant_service.list().await?;
    Ok(Json(tenants))
}

/// GET /tenants/:tenant_id
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<TenantWithRetailers>, AppError> {
    let tenant = state.tenant_service.get(&TenantId(tenant_id)).await?;
    Ok(Json(tenant))
}
