use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub retailer_id: Uuid,
    /// Store number as it appears in the retailer's POS exports
    pub external_code: String,
    pub name: String,
    pub city: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::retailers::Entity",
        from = "Column::RetailerId",
        to = "super::retailers::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Retailer,
}

impl Related<super::retailers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Retailer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
