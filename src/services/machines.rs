use crate::{
    commands::{
        guards,
        processes::{lock_process, process_fields, validate_field_values},
    },
    db::DbPool,
    errors::ServiceError,
    models::{machine, machine_process, process_name, RecordStatus},
    services::{contains_ci, fetch_page, non_blank, Page},
    validation::non_negative_decimal,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMachineRequest {
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub machine_name: String,
    #[validate(length(max = 64))]
    pub machine_code: Option<String>,
    #[validate(length(max = 128))]
    pub machine_type: Option<String>,
    #[validate(length(max = 255))]
    pub manufacturer: Option<String>,
    #[validate(custom = "non_negative_decimal")]
    #[schema(value_type = Option<String>, example = "1200")]
    pub capacity_per_hour: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateMachineRequest {
    #[validate(length(min = 1, max = 255))]
    pub machine_name: Option<String>,
    #[validate(length(max = 64))]
    pub machine_code: Option<String>,
    #[validate(length(max = 128))]
    pub machine_type: Option<String>,
    #[validate(length(max = 255))]
    pub manufacturer: Option<String>,
    #[validate(custom = "non_negative_decimal")]
    #[schema(value_type = Option<String>)]
    pub capacity_per_hour: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MachineFilter {
    pub company_id: Option<Uuid>,
    /// Matches the machine name or code
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
}

/// Field values for one process on one machine, keyed by `field_key`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProcessValuesRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub field_values: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignedProcess {
    pub process_id: Uuid,
    pub process_name: String,
    #[schema(value_type = Object)]
    pub field_values: Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MachineWithProcesses {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub machine: machine::Model,
    pub processes: Vec<AssignedProcess>,
}

#[derive(Clone)]
pub struct MachineService {
    db_pool: Arc<DbPool>,
}

impl MachineService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(company_id = %request.company_id))]
    pub async fn create_machine(
        &self,
        request: CreateMachineRequest,
        actor: Option<Uuid>,
    ) -> Result<machine::Model, ServiceError> {
        request.validate()?;
        guards::active_company(&*self.db_pool, request.company_id).await?;

        let now = Utc::now();
        let machine = machine::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(request.company_id),
            machine_name: Set(request.machine_name.trim().to_string()),
            machine_code: Set(non_blank(request.machine_code)),
            machine_type: Set(non_blank(request.machine_type)),
            manufacturer: Set(non_blank(request.manufacturer)),
            capacity_per_hour: Set(request.capacity_per_hour),
            status: Set(RecordStatus::Active),
            created_by: Set(actor),
            updated_by: Set(actor),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(machine_id = %machine.id, "machine created");
        Ok(machine)
    }

    #[instrument(skip(self))]
    pub async fn get_machine(&self, id: Uuid) -> Result<MachineWithProcesses, ServiceError> {
        let machine = self.find(id).await?;
        let assignments = machine_process::Entity::find()
            .filter(machine_process::Column::MachineId.eq(id))
            .find_also_related(process_name::Entity)
            .order_by_asc(machine_process::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let processes = assignments
            .into_iter()
            .map(|(assignment, process)| AssignedProcess {
                process_id: assignment.process_id,
                process_name: process.map(|p| p.process_name).unwrap_or_default(),
                field_values: assignment.field_values,
            })
            .collect();
        Ok(MachineWithProcesses { machine, processes })
    }

    #[instrument(skip(self))]
    pub async fn list_machines(
        &self,
        filter: MachineFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<machine::Model>, ServiceError> {
        let mut query = machine::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(machine::Column::CompanyId.eq(company_id));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(machine::Column::MachineName, term))
                    .add(contains_ci(machine::Column::MachineCode, term)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(machine::Column::Status.eq(status));
        }
        let query = query.order_by_asc(machine::Column::MachineName);
        fetch_page(&self.db_pool, query, page, limit).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_machine(
        &self,
        id: Uuid,
        request: UpdateMachineRequest,
        actor: Option<Uuid>,
    ) -> Result<machine::Model, ServiceError> {
        request.validate()?;
        let existing = self.find(id).await?;

        let mut active: machine::ActiveModel = existing.into();
        if let Some(machine_name) = request.machine_name {
            active.machine_name = Set(machine_name.trim().to_string());
        }
        if let Some(machine_code) = request.machine_code {
            active.machine_code = Set(non_blank(Some(machine_code)));
        }
        if let Some(machine_type) = request.machine_type {
            active.machine_type = Set(non_blank(Some(machine_type)));
        }
        if let Some(manufacturer) = request.manufacturer {
            active.manufacturer = Set(non_blank(Some(manufacturer)));
        }
        if request.capacity_per_hour.is_some() {
            active.capacity_per_hour = Set(request.capacity_per_hour);
        }
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());

        let machine = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(machine_id = %machine.id, "machine updated");
        Ok(machine)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_machine(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<machine::Model, ServiceError> {
        let existing = self.find(id).await?;
        let mut active: machine::ActiveModel = existing.into();
        active.status = Set(RecordStatus::Inactive);
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());
        let machine = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(machine_id = %machine.id, "machine deactivated");
        Ok(machine)
    }

    /// Assigns a process to a machine, or replaces the stored values when it
    /// is already assigned.
    #[instrument(skip(self, request))]
    pub async fn assign_process(
        &self,
        machine_id: Uuid,
        process_id: Uuid,
        request: ProcessValuesRequest,
    ) -> Result<machine_process::Model, ServiceError> {
        let values = request.field_values;
        self.db_pool
            .transaction::<_, machine_process::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let (machine, process) = machine_and_process(txn, machine_id, process_id).await?;
                    if let Some(existing) = find_assignment(txn, machine.id, process.id).await? {
                        return write_values(txn, existing, values).await;
                    }

                    let fields = process_fields(txn, process.id).await?;
                    validate_field_values(&fields, &values)?;

                    let now = Utc::now();
                    let assignment = machine_process::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        machine_id: Set(machine.id),
                        process_id: Set(process.id),
                        field_values: Set(Value::Object(values)),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                    info!(
                        machine_id = %machine.id,
                        process = %process.process_name,
                        "process assigned to machine"
                    );
                    Ok(assignment)
                })
            })
            .await
            .map_err(ServiceError::from)
    }

    /// Replaces the values of an existing assignment.
    #[instrument(skip(self, request))]
    pub async fn update_process_values(
        &self,
        machine_id: Uuid,
        process_id: Uuid,
        request: ProcessValuesRequest,
    ) -> Result<machine_process::Model, ServiceError> {
        let values = request.field_values;
        self.db_pool
            .transaction::<_, machine_process::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let (machine, process) = machine_and_process(txn, machine_id, process_id).await?;
                    let existing = find_assignment(txn, machine.id, process.id)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "machine {} does not run process {}",
                                machine.id, process.process_name
                            ))
                        })?;
                    write_values(txn, existing, values).await
                })
            })
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn unassign_process(
        &self,
        machine_id: Uuid,
        process_id: Uuid,
    ) -> Result<machine_process::Model, ServiceError> {
        let existing = find_assignment(&*self.db_pool, machine_id, process_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "machine {} does not run process {}",
                    machine_id, process_id
                ))
            })?;
        existing
            .clone()
            .delete(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(%machine_id, %process_id, "process unassigned from machine");
        Ok(existing)
    }

    async fn find(&self, id: Uuid) -> Result<machine::Model, ServiceError> {
        find_machine(&*self.db_pool, id).await
    }
}

async fn find_machine<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<machine::Model, ServiceError> {
    machine::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Machine", id))
}

/// An active machine and an active process of the same company. The process
/// row stays locked until the caller's transaction ends.
async fn machine_and_process<C: ConnectionTrait>(
    conn: &C,
    machine_id: Uuid,
    process_id: Uuid,
) -> Result<(machine::Model, process_name::Model), ServiceError> {
    let machine = find_machine(conn, machine_id).await?;
    if machine.status != RecordStatus::Active {
        return Err(ServiceError::InvalidOperation(format!(
            "machine {} is inactive",
            machine.machine_name
        )));
    }
    let process = lock_process(conn, process_id).await?;
    if process.company_id != machine.company_id {
        return Err(ServiceError::ValidationError(format!(
            "process {} belongs to a different company than machine {}",
            process.process_name, machine.machine_name
        )));
    }
    Ok((machine, process))
}

async fn find_assignment<C: ConnectionTrait>(
    conn: &C,
    machine_id: Uuid,
    process_id: Uuid,
) -> Result<Option<machine_process::Model>, ServiceError> {
    machine_process::Entity::find()
        .filter(machine_process::Column::MachineId.eq(machine_id))
        .filter(machine_process::Column::ProcessId.eq(process_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)
}

async fn write_values<C: ConnectionTrait>(
    conn: &C,
    existing: machine_process::Model,
    values: Map<String, Value>,
) -> Result<machine_process::Model, ServiceError> {
    let fields = process_fields(conn, existing.process_id).await?;
    validate_field_values(&fields, &values)?;

    let mut active: machine_process::ActiveModel = existing.into();
    active.field_values = Set(Value::Object(values));
    active.updated_at = Set(Utc::now());
    let assignment = active.update(conn).await.map_err(ServiceError::db_error)?;
    info!(
        machine_id = %assignment.machine_id,
        process_id = %assignment.process_id,
        "machine process values updated"
    );
    Ok(assignment)
}
