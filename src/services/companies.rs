use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{company, RecordStatus},
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
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub legal_name: Option<String>,
    #[validate(length(equal = 15, message = "GSTIN must be 15 characters"))]
    pub gst_number: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[validate(length(max = 16))]
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub legal_name: Option<String>,
    #[validate(length(equal = 15, message = "GSTIN must be 15 characters"))]
    pub gst_number: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[validate(length(max = 16))]
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CompanyFilter {
    /// Case-insensitive match on the company name
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
}

/// Service for managing companies
#[derive(Clone)]
pub struct CompanyService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CompanyService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_company(
        &self,
        request: CreateCompanyRequest,
        actor: Option<Uuid>,
    ) -> Result<company::Model, ServiceError> {
        request.validate()?;
        let name = request.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let now = Utc::now();
        let company = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            legal_name: Set(non_blank(request.legal_name)),
            gst_number: Set(non_blank(request.gst_number).map(|g| g.to_uppercase())),
            email: Set(non_blank(request.email)),
            phone: Set(non_blank(request.phone)),
            address: Set(non_blank(request.address)),
            city: Set(non_blank(request.city)),
            state: Set(non_blank(request.state)),
            country: Set(non_blank(request.country)),
            pincode: Set(non_blank(request.pincode)),
            status: Set(RecordStatus::Active),
            created_by: Set(actor),
            updated_by: Set(actor),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(company_id = %company.id, "company created");
        self.event_sender
            .send_or_log(Event::CompanyCreated(company.id))
            .await;
        Ok(company)
    }

    #[instrument(skip(self))]
    pub async fn get_company(&self, id: Uuid) -> Result<company::Model, ServiceError> {
        company::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Company", id))
    }

    #[instrument(skip(self))]
    pub async fn list_companies(
        &self,
        filter: CompanyFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<company::Model>, ServiceError> {
        let mut query = company::Entity::find();
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            query = query.filter(contains_ci(company::Column::Name, term));
        }
        if let Some(status) = filter.status {
            query = query.filter(company::Column::Status.eq(status));
        }
        let query = query.order_by_asc(company::Column::Name);
        fetch_page(&self.db_pool, query, page, limit).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_company(
        &self,
        id: Uuid,
        request: UpdateCompanyRequest,
        actor: Option<Uuid>,
    ) -> Result<company::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_company(id).await?;

        let mut active: company::ActiveModel = existing.into();
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            self.ensure_name_free(&name, Some(id)).await?;
            active.name = Set(name);
        }
        if let Some(legal_name) = request.legal_name {
            active.legal_name = Set(non_blank(Some(legal_name)));
        }
        if let Some(gst_number) = request.gst_number {
            active.gst_number = Set(non_blank(Some(gst_number)).map(|g| g.to_uppercase()));
        }
        if let Some(email) = request.email {
            active.email = Set(non_blank(Some(email)));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(non_blank(Some(phone)));
        }
        if let Some(address) = request.address {
            active.address = Set(non_blank(Some(address)));
        }
        if let Some(city) = request.city {
            active.city = Set(non_blank(Some(city)));
        }
        if let Some(state) = request.state {
            active.state = Set(non_blank(Some(state)));
        }
        if let Some(country) = request.country {
            active.country = Set(non_blank(Some(country)));
        }
        if let Some(pincode) = request.pincode {
            active.pincode = Set(non_blank(Some(pincode)));
        }
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());

        let company = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(company_id = %company.id, "company updated");
        Ok(company)
    }

    /// Soft delete.
    #[instrument(skip(self))]
    pub async fn deactivate_company(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<company::Model, ServiceError> {
        self.set_status(id, RecordStatus::Inactive, actor).await
    }

    #[instrument(skip(self))]
    pub async fn activate_company(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<company::Model, ServiceError> {
        let existing = self.get_company(id).await?;
        self.ensure_name_free(&existing.name, Some(id)).await?;
        self.set_status(id, RecordStatus::Active, actor).await
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: RecordStatus,
        actor: Option<Uuid>,
    ) -> Result<company::Model, ServiceError> {
        let existing = self.get_company(id).await?;
        let mut active: company::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());
        let company = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(company_id = %company.id, status = ?company.status, "company status changed");
        Ok(company)
    }

    /// Company names are unique among active companies, ignoring case.
    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = company::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(company::Column::Name))).eq(name.to_lowercase()))
            .filter(company::Column::Status.eq(RecordStatus::Active));
        if let Some(id) = except {
            query = query.filter(company::Column::Id.ne(id));
        }
        let taken = query
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!(
                "a company named '{}' already exists",
                name
            )));
        }
        Ok(())
    }
}
