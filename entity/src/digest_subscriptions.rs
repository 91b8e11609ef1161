use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "digest_subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub retailer_id: Option<Uuid>,
    pub email: String,
    /// daily | weekly | monthly
    pub frequency: String,
    pub active: bool,
    pub last_sent_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub unsubscribed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::newsletter_send_logs::Entity")]
    SendLogs,
}

impl Related<super::newsletter_send_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SendLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
