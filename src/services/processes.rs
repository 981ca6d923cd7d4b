use crate::{
    commands::{
        guards,
        processes::{
            active_process, process_fields, AddProcessFieldCommand, RemoveProcessFieldCommand,
            UpdateProcessFieldCommand,
        },
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{process_field, process_name, RecordStatus},
    services::{contains_ci, fetch_page, non_blank, Page},
};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProcessRequest {
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub process_name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProcessRequest {
    #[validate(length(min = 1, max = 255))]
    pub process_name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ProcessFilter {
    pub company_id: Option<Uuid>,
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessWithFields {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub process: process_name::Model,
    #[schema(value_type = Vec<Object>)]
    pub fields: Vec<process_field::Model>,
}

/// Production processes and their dynamic field definitions.
#[derive(Clone)]
pub struct ProcessService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProcessService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(company_id = %request.company_id))]
    pub async fn create_process(
        &self,
        request: CreateProcessRequest,
        actor: Option<Uuid>,
    ) -> Result<process_name::Model, ServiceError> {
        request.validate()?;
        guards::active_company(&*self.db_pool, request.company_id).await?;
        let name = request.process_name.trim().to_string();
        self.ensure_name_free(request.company_id, &name, None).await?;

        let now = Utc::now();
        let process = process_name::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(request.company_id),
            process_name: Set(name),
            description: Set(non_blank(request.description)),
            status: Set(RecordStatus::Active),
            created_by: Set(actor),
            updated_by: Set(actor),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(process_id = %process.id, process_name = %process.process_name, "process created");
        Ok(process)
    }

    #[instrument(skip(self))]
    pub async fn get_process(&self, id: Uuid) -> Result<ProcessWithFields, ServiceError> {
        let process = self.find(id).await?;
        let fields = process_fields(&*self.db_pool, id).await?;
        Ok(ProcessWithFields { process, fields })
    }

    #[instrument(skip(self))]
    pub async fn list_processes(
        &self,
        filter: ProcessFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<process_name::Model>, ServiceError> {
        let mut query = process_name::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(process_name::Column::CompanyId.eq(company_id));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            query = query.filter(contains_ci(process_name::Column::ProcessName, term));
        }
        if let Some(status) = filter.status {
            query = query.filter(process_name::Column::Status.eq(status));
        }
        let query = query.order_by_asc(process_name::Column::ProcessName);
        fetch_page(&self.db_pool, query, page, limit).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_process(
        &self,
        id: Uuid,
        request: UpdateProcessRequest,
        actor: Option<Uuid>,
    ) -> Result<process_name::Model, ServiceError> {
        request.validate()?;
        let existing = self.find(id).await?;
        let company_id = existing.company_id;

        let mut active: process_name::ActiveModel = existing.into();
        if let Some(name) = request.process_name {
            let name = name.trim().to_string();
            self.ensure_name_free(company_id, &name, Some(id)).await?;
            active.process_name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(non_blank(Some(description)));
        }
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());

        let process = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(process_id = %process.id, "process updated");
        Ok(process)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_process(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<process_name::Model, ServiceError> {
        let existing = active_process(&*self.db_pool, id).await?;
        let mut active: process_name::ActiveModel = existing.into();
        active.status = Set(RecordStatus::Inactive);
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());
        let process = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(process_id = %process.id, "process deactivated");
        Ok(process)
    }

    #[instrument(skip(self, command), fields(field_key = %command.field_key))]
    pub async fn add_field(
        &self,
        process_id: Uuid,
        mut command: AddProcessFieldCommand,
    ) -> Result<process_field::Model, ServiceError> {
        command.process_id = process_id;
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self, command))]
    pub async fn update_field(
        &self,
        process_id: Uuid,
        field_id: Uuid,
        mut command: UpdateProcessFieldCommand,
    ) -> Result<process_field::Model, ServiceError> {
        command.process_id = process_id;
        command.field_id = field_id;
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_field(
        &self,
        process_id: Uuid,
        field_id: Uuid,
    ) -> Result<process_field::Model, ServiceError> {
        RemoveProcessFieldCommand {
            process_id,
            field_id,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    async fn find(&self, id: Uuid) -> Result<process_name::Model, ServiceError> {
        process_name::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Process", id))
    }

    /// Process names are unique per company among active rows, ignoring case.
    async fn ensure_name_free(
        &self,
        company_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = process_name::Entity::find()
            .filter(process_name::Column::CompanyId.eq(company_id))
            .filter(process_name::Column::Status.eq(RecordStatus::Active))
            .filter(
                Expr::expr(Func::lower(Expr::col(process_name::Column::ProcessName)))
                    .eq(name.to_lowercase()),
            );
        if let Some(id) = except {
            query = query.filter(process_name::Column::Id.ne(id));
        }
        let taken = query
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "a process named '{}' already exists",
                name
            )));
        }
        Ok(())
    }
}
