use super::common::RecordStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A production step (printing, slotting, stitching...) that machines run.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "process_names")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub process_name: String,
    pub description: Option<String>,
    pub status: RecordStatus,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::process_field::Entity")]
    Fields,
    #[sea_orm(has_many = "super::machine_process::Entity")]
    MachineProcesses,
}

impl Related<super::process_field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fields.def()
    }
}

impl Related<super::machine_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MachineProcesses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
