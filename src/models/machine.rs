use super::common::RecordStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "machines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub machine_name: String,
    pub machine_code: Option<String>,
    pub machine_type: Option<String>,
    pub manufacturer: Option<String>,
    pub capacity_per_hour: Option<Decimal>,
    pub status: RecordStatus,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::machine_process::Entity")]
    Processes,
}

impl Related<super::machine_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Processes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
