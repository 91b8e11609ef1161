//! PostgreSQL adapter for SubscriptionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use entity::digest_subscriptions;

use crate::domain::entities::{
    DigestFrequency, DigestSubscription, RetailerId, SubscriptionId, TenantId,
};
use crate::domain::ports::SubscriptionRepository;
use crate::error::DomainError;

/// PostgreSQL implementation of SubscriptionRepository
pub struct PostgresSubscriptionRepository {
    db: DatabaseConnection,
}

impl PostgresSubscriptionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_id(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<DigestSubscription>, DomainError> {
        let result = digest_subscriptions::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(DigestSubscription::try_from).transpose()
    }

    async fn find_active(&self) -> Result<Vec<DigestSubscription>, DomainError> {
        let results = digest_subscriptions::Entity::find()
            .filter(digest_subscriptions::Column::Active.eq(true))
            .order_by_asc(digest_subscriptions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        // A row with an unknown frequency should not block everyone else's digest
        Ok(results
            .into_iter()
            .filter_map(|m| {
                let id = m.id;
                match DigestSubscription::try_from(m) {
                    Ok(sub) => Some(sub),
                    Err(e) => {
                        tracing::warn!(error = %e, subscription_id = %id, "Skipping subscription");
                        None
                    }
                }
            })
            .collect())
    }

    async fn mark_sent(&self, id: &SubscriptionId, at: DateTime<Utc>) -> Result<(), DomainError> {
        digest_subscriptions::Entity::update_many()
            .col_expr(
                digest_subscriptions::Column::LastSentAt,
                Expr::value(at.fixed_offset()),
            )
            .filter(digest_subscriptions::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }

    async fn deactivate(
        &self,
        id: &SubscriptionId,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = digest_subscriptions::Entity::update_many()
            .col_expr(digest_subscriptions::Column::Active, Expr::value(false))
            .col_expr(
                digest_subscriptions::Column::UnsubscribedAt,
                Expr::value(at.fixed_offset()),
            )
            .filter(digest_subscriptions::Column::Id.eq(id.0))
            .filter(digest_subscriptions::Column::Active.eq(true))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<digest_subscriptions::Model> for DigestSubscription {
    type Error = DomainError;

    fn try_from(model: digest_subscriptions::Model) -> Result<Self, Self::Error> {
        let frequency: DigestFrequency = model
            .frequency
            .parse()
            .map_err(DomainError::Internal)?;

        Ok(DigestSubscription {
            id: SubscriptionId(model.id),
            tenant_id: TenantId(model.tenant_id),
            retailer_id: model.retailer_id.map(RetailerId),
            email: model.email,
            frequency,
            active: model.active,
            last_sent_at: model.last_sent_at.map(|t| t.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            unsubscribed_at: model.unsubscribed_at.map(|t| t.with_timezone(&Utc)),
        })
    }
}
