//! PostgreSQL lookups and fact upserts

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use entity::{fact_sales, inventory_snapshots, products, retailers, stores};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::ImportError;
use crate::fact::{Fact, ImportKind, Measure};
use crate::mapping::IdMapper;
use crate::sink::FactSink;

/// Fail unless `retailer_id` exists under `tenant_id`
pub async fn verify_retailer(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    retailer_id: Uuid,
) -> Result<(), ImportError> {
    let retailer = retailers::Entity::find_by_id(retailer_id).one(db).await?;

    match retailer {
        Some(r) if r.tenant_id == tenant_id => Ok(()),
        _ => Err(ImportError::UnknownRetailer {
            tenant_id,
            retailer_id,
        }),
    }
}

/// Build lookups from the retailer's stores and the tenant's products
pub async fn load_mapper(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    retailer_id: Uuid,
) -> Result<IdMapper, ImportError> {
    let stores = stores::Entity::find()
        .filter(stores::Column::TenantId.eq(tenant_id))
        .filter(stores::Column::RetailerId.eq(retailer_id))
        .all(db)
        .await?;

    let products = products::Entity::find()
        .filter(products::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?;

    tracing::debug!(
        stores = stores.len(),
        products = products.len(),
        "Loaded lookup tables"
    );

    Ok(IdMapper::new(
        stores.into_iter().map(|s| (s.external_code, s.id)),
        products.into_iter().map(|p| (p.ean, p.id)),
    ))
}

/// Upserts into `fact_sales` or `inventory_snapshots` for one tenant and retailer
pub struct PostgresFactSink {
    db: DatabaseConnection,
    kind: ImportKind,
    tenant_id: Uuid,
    retailer_id: Uuid,
    updated_at: DateTime<FixedOffset>,
}

impl PostgresFactSink {
    pub fn new(db: DatabaseConnection, kind: ImportKind, tenant_id: Uuid, retailer_id: Uuid) -> Self {
        Self {
            db,
            kind,
            tenant_id,
            retailer_id,
            updated_at: Utc::now().fixed_offset(),
        }
    }

    async fn upsert_sales(&self, facts: &[Fact]) -> Result<(), ImportError> {
        let models = facts
            .iter()
            .map(|fact| match fact.measure {
                Measure::Sales { units, revenue } => Ok(fact_sales::ActiveModel {
                    tenant_id: Set(self.tenant_id),
                    retailer_id: Set(self.retailer_id),
                    store_id: Set(fact.key.store_id),
                    product_id: Set(fact.key.product_id),
                    date: Set(fact.key.date),
                    units: Set(units),
                    revenue: Set(revenue),
                    updated_at: Set(self.updated_at),
                }),
                Measure::Stock { .. } => Err(ImportError::Rejected(
                    "stock row in a sales import".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        fact_sales::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    fact_sales::Column::TenantId,
                    fact_sales::Column::RetailerId,
                    fact_sales::Column::StoreId,
                    fact_sales::Column::ProductId,
                    fact_sales::Column::Date,
                ])
                .update_columns([
                    fact_sales::Column::Units,
                    fact_sales::Column::Revenue,
                    fact_sales::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    async fn upsert_inventory(&self, facts: &[Fact]) -> Result<(), ImportError> {
        let models = facts
            .iter()
            .map(|fact| match fact.measure {
                Measure::Stock { units } => Ok(inventory_snapshots::ActiveModel {
                    tenant_id: Set(self.tenant_id),
                    retailer_id: Set(self.retailer_id),
                    store_id: Set(fact.key.store_id),
                    product_id: Set(fact.key.product_id),
                    date: Set(fact.key.date),
                    stock_units: Set(units),
                    updated_at: Set(self.updated_at),
                }),
                Measure::Sales { .. } => Err(ImportError::Rejected(
                    "sales row in an inventory import".to_string(),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        inventory_snapshots::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    inventory_snapshots::Column::TenantId,
                    inventory_snapshots::Column::RetailerId,
                    inventory_snapshots::Column::StoreId,
                    inventory_snapshots::Column::ProductId,
                    inventory_snapshots::Column::Date,
                ])
                .update_columns([
                    inventory_snapshots::Column::StockUnits,
                    inventory_snapshots::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl FactSink for PostgresFactSink {
    async fn upsert(&self, facts: &[Fact]) -> Result<(), ImportError> {
        if facts.is_empty() {
            return Ok(());
        }
        match self.kind {
            ImportKind::Sales => self.upsert_sales(facts).await,
            ImportKind::Inventory => self.upsert_inventory(facts).await,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Run with: TEST_DATABASE_URL=postgres://... cargo test -p sellout-importer -- --ignored

    use super::*;
    use crate::test_utils::fact_for_store;
    use sea_orm::Database;

    async fn connect() -> DatabaseConnection {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        Database::connect(&url).await.expect("Failed to connect")
    }

    #[tokio::test]
    #[ignore]
    async fn unknown_retailer_is_rejected() {
        let db = connect().await;

        let err = verify_retailer(&db, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::UnknownRetailer { .. }));
    }

    #[tokio::test]
    #[ignore]
    async fn mismatched_measure_is_rejected_before_writing() {
        let db = connect().await;
        let sink = PostgresFactSink::new(db, ImportKind::Inventory, Uuid::new_v4(), Uuid::new_v4());

        let err = sink.upsert(&[fact_for_store(Uuid::new_v4())]).await.unwrap_err();

        assert!(matches!(err, ImportError::Rejected(_)));
    }
}
