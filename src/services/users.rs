use crate::{
    auth::hash_password,
    commands::guards,
    db::DbPool,
    errors::ServiceError,
    models::{user, RecordStatus, UserRole},
    services::{contains_ci, fetch_page, Page},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Company the user works for; admins may have none
    pub company_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    pub company_id: Option<Uuid>,
    pub role: Option<UserRole>,
    pub status: Option<RecordStatus>,
    /// Matches name or email
    pub search: Option<String>,
}

/// User accounts. Passwords are stored as argon2 hashes.
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(email = %request.email, role = %request.role))]
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
        actor: Option<Uuid>,
    ) -> Result<user::Model, ServiceError> {
        request.validate()?;
        if request.role != UserRole::Admin && request.company_id.is_none() {
            return Err(ServiceError::ValidationError(
                "company_id is required for non-admin users".to_string(),
            ));
        }
        if let Some(company_id) = request.company_id {
            guards::active_company(&*self.db_pool, company_id).await?;
        }

        let email = request.email.trim().to_lowercase();
        let taken = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "a user with email {} already exists",
                email
            )));
        }

        let password_hash =
            hash_password(&request.password).map_err(|e| ServiceError::HashError(e.to_string()))?;
        let now = Utc::now();
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(request.company_id),
            name: Set(request.name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(request.role),
            status: Set(RecordStatus::Active),
            created_by: Set(actor),
            updated_by: Set(actor),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        filter: UserFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<user::Model>, ServiceError> {
        let mut query = user::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(user::Column::CompanyId.eq(company_id));
        }
        if let Some(role) = filter.role {
            query = query.filter(user::Column::Role.eq(role));
        }
        if let Some(status) = filter.status {
            query = query.filter(user::Column::Status.eq(status));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(user::Column::Name, term))
                    .add(contains_ci(user::Column::Email, term)),
            );
        }
        let query = query.order_by_asc(user::Column::Email);
        fetch_page(&self.db_pool, query, page, limit).await
    }

    /// Soft delete. Users cannot deactivate themselves.
    #[instrument(skip(self))]
    pub async fn deactivate_user(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<user::Model, ServiceError> {
        if actor == Some(id) {
            return Err(ServiceError::InvalidOperation(
                "you cannot deactivate your own account".to_string(),
            ));
        }
        let existing = user::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("User", id))?;

        let mut active: user::ActiveModel = existing.into();
        active.status = Set(RecordStatus::Inactive);
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());
        let user = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(user_id = %user.id, "user deactivated");
        Ok(user)
    }
}
