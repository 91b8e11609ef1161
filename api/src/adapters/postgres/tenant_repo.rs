//! PostgreSQL adapter for TenantRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use entity::{retailers, tenants};

use crate::domain::entities::{Retailer, RetailerId, Tenant, TenantId};
use crate::domain::ports::TenantRepository;
use crate::error::DomainError;

/// PostgreSQL implementation of TenantRepository
pub struct PostgresTenantRepository {
    db: DatabaseConnection,
}

impl PostgresTenantRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError> {
        let result = tenants::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_active(&self) -> Result<Vec<Tenant>, DomainError> {
        let results = tenants::Entity::find()
            .filter(tenants::Column::Active.eq(true))
            .order_by_asc(tenants::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn find_retailers(&self, tenant_ids: &[TenantId]) -> Result<Vec<Retailer>, DomainError> {
        if tenant_ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = retailers::Entity::find()
            .filter(retailers::Column::TenantId.is_in(tenant_ids.iter().map(|t| t.0)))
            .order_by_asc(retailers::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }
}

impl From<tenants::Model> for Tenant {
    fn from(model: tenants::Model) -> Self {
        Tenant {
            id: TenantId(model.id),
            name: model.name,
            slug: model.slug,
            active: model.active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<retailers::Model> for Retailer {
    fn from(model: retailers::Model) -> Self {
        Retailer {
            id: RetailerId(model.id),
            tenant_id: TenantId(model.tenant_id),
            name: model.name,
            code: model.code,
        }
    }
}
