//! PostgreSQL adapter for SendLogRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use entity::newsletter_send_logs;

use crate::domain::entities::{
    NewSendLog, SendLog, SendLogId, SendStatus, SubscriptionId, TenantId,
};
use crate::domain::ports::SendLogRepository;
use crate::error::DomainError;

/// PostgreSQL implementation of SendLogRepository
pub struct PostgresSendLogRepository {
    db: DatabaseConnection,
}

impl PostgresSendLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SendLogRepository for PostgresSendLogRepository {
    async fn create(&self, log: &NewSendLog) -> Result<SendLog, DomainError> {
        let model = newsletter_send_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            subscription_id: Set(log.subscription_id.0),
            tenant_id: Set(log.tenant_id.0),
            email: Set(log.email.clone()),
            subject: Set(log.subject.clone()),
            status: Set(log.status.to_string()),
            provider_message_id: Set(log.provider_message_id.clone()),
            error: Set(log.error.clone()),
            sent_at: Set(Utc::now().fixed_offset()),
            delivered_at: Set(None),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.try_into()
    }

    async fn find_by_provider_message_id(
        &self,
        message_id: &str,
    ) -> Result<Option<SendLog>, DomainError> {
        let result = newsletter_send_logs::Entity::find()
            .filter(newsletter_send_logs::Column::ProviderMessageId.eq(message_id))
            .order_by_desc(newsletter_send_logs::Column::SentAt)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(SendLog::try_from).transpose()
    }

    async fn update_status(
        &self,
        message_id: &str,
        status: SendStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError> {
        let mut update = newsletter_send_logs::Entity::update_many()
            .col_expr(
                newsletter_send_logs::Column::Status,
                Expr::value(status.to_string()),
            )
            .filter(newsletter_send_logs::Column::ProviderMessageId.eq(message_id));

        if let Some(at) = delivered_at {
            update = update.col_expr(
                newsletter_send_logs::Column::DeliveredAt,
                Expr::value(at.fixed_offset()),
            );
        }

        update
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(())
    }
}

/// Convert SeaORM model to domain entity
impl TryFrom<newsletter_send_logs::Model> for SendLog {
    type Error = DomainError;

    fn try_from(model: newsletter_send_logs::Model) -> Result<Self, Self::Error> {
        let status: SendStatus = model.status.parse().map_err(DomainError::Internal)?;

        Ok(SendLog {
            id: SendLogId(model.id),
            subscription_id: SubscriptionId(model.subscription_id),
            tenant_id: TenantId(model.tenant_id),
            email: model.email,
            subject: model.subject,
            status,
            provider_message_id: model.provider_message_id,
            error: model.error,
            sent_at: model.sent_at.with_timezone(&Utc),
            delivered_at: model.delivered_at.map(|t| t.with_timezone(&Utc)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(status: &str) -> newsletter_send_logs::Model {
        newsletter_send_logs::Model {
            id: Uuid::new_v4(),
            subscription_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            email: "buyer@example.com".to_string(),
            subject: "Weekly sell-out digest".to_string(),
            status: status.to_string(),
            provider_message_id: Some("msg-1".to_string()),
            error: None,
            sent_at: Utc::now().fixed_offset(),
            delivered_at: None,
        }
    }

    #[test]
    fn known_status_converts() {
        let log = SendLog::try_from(model("Delivered")).unwrap();
        assert_eq!(log.status, SendStatus::Delivered);
    }

    #[test]
    fn unknown_status_is_an_error() {
        let err = SendLog::try_from(model("deferred")).unwrap_err();
        assert!(matches!(err, DomainError::Internal(ref msg) if msg.contains("deferred")));
    }
}
