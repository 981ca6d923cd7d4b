use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One received line of a GRN; `received = accepted + rejected`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grn_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub grn_id: Uuid,
    pub purchase_order_item_id: Uuid,
    pub sku_id: Uuid,
    pub received_quantity: i32,
    pub accepted_quantity: i32,
    pub rejected_quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::grn::Entity",
        from = "Column::GrnId",
        to = "super::grn::Column::Id"
    )]
    Grn,
}

impl Related<super::grn::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grn.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
