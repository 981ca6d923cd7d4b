use crate::{
    commands::guards,
    db::DbPool,
    documents::{next_document_number, DocumentPrefix},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{client, RecordStatus},
    services::{contains_ci, fetch_page, non_blank, Page},
    validation::non_negative_decimal,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateClientRequest {
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(equal = 15, message = "GSTIN must be 15 characters"))]
    pub gst_number: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<String>,
    #[validate(custom = "non_negative_decimal")]
    #[schema(value_type = Option<String>, example = "250000.00")]
    pub credit_limit: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(equal = 15, message = "GSTIN must be 15 characters"))]
    pub gst_number: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<String>,
    #[validate(custom = "non_negative_decimal")]
    #[schema(value_type = Option<String>)]
    pub credit_limit: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ClientFilter {
    pub company_id: Option<Uuid>,
    /// Matches name, client code, contact person or email
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
}

#[derive(Clone)]
pub struct ClientService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    number_width: usize,
}

impl ClientService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, number_width: usize) -> Self {
        Self {
            db_pool,
            event_sender,
            number_width,
        }
    }

    /// Creates a client under an active company and assigns its `CLI-` code.
    #[instrument(skip(self, request), fields(company_id = %request.company_id))]
    pub async fn create_client(
        &self,
        request: CreateClientRequest,
        actor: Option<Uuid>,
    ) -> Result<client::Model, ServiceError> {
        request.validate()?;
        let width = self.number_width;

        let client = self
            .db_pool
            .transaction::<_, client::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    guards::active_company(txn, request.company_id).await?;
                    let client_code = next_document_number(
                        txn,
                        request.company_id,
                        DocumentPrefix::Client,
                        width,
                    )
                    .await?;

                    let now = Utc::now();
                    client::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        company_id: Set(request.company_id),
                        client_code: Set(client_code),
                        name: Set(request.name.trim().to_string()),
                        contact_person: Set(non_blank(request.contact_person)),
                        email: Set(non_blank(request.email)),
                        phone: Set(non_blank(request.phone)),
                        gst_number: Set(non_blank(request.gst_number).map(|g| g.to_uppercase())),
                        billing_address: Set(non_blank(request.billing_address)),
                        shipping_address: Set(non_blank(request.shipping_address)),
                        credit_limit: Set(request.credit_limit),
                        status: Set(RecordStatus::Active),
                        created_by: Set(actor),
                        updated_by: Set(actor),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(client_id = %client.id, client_code = %client.client_code, "client created");
        self.event_sender
            .send_or_log(Event::ClientCreated {
                client_id: client.id,
                company_id: client.company_id,
            })
            .await;
        Ok(client)
    }

    #[instrument(skip(self))]
    pub async fn get_client(&self, id: Uuid) -> Result<client::Model, ServiceError> {
        client::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Client", id))
    }

    #[instrument(skip(self))]
    pub async fn list_clients(
        &self,
        filter: ClientFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<client::Model>, ServiceError> {
        let mut query = client::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(client::Column::CompanyId.eq(company_id));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(client::Column::Name, term))
                    .add(contains_ci(client::Column::ClientCode, term))
                    .add(contains_ci(client::Column::ContactPerson, term))
                    .add(contains_ci(client::Column::Email, term)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(client::Column::Status.eq(status));
        }
        let query = query.order_by_asc(client::Column::Name);
        fetch_page(&self.db_pool, query, page, limit).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_client(
        &self,
        id: Uuid,
        request: UpdateClientRequest,
        actor: Option<Uuid>,
    ) -> Result<client::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_client(id).await?;

        let mut active: client::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(contact_person) = request.contact_person {
            active.contact_person = Set(non_blank(Some(contact_person)));
        }
        if let Some(email) = request.email {
            active.email = Set(non_blank(Some(email)));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(non_blank(Some(phone)));
        }
        if let Some(gst_number) = request.gst_number {
            active.gst_number = Set(non_blank(Some(gst_number)).map(|g| g.to_uppercase()));
        }
        if let Some(billing_address) = request.billing_address {
            active.billing_address = Set(non_blank(Some(billing_address)));
        }
        if let Some(shipping_address) = request.shipping_address {
            active.shipping_address = Set(non_blank(Some(shipping_address)));
        }
        if request.credit_limit.is_some() {
            active.credit_limit = Set(request.credit_limit);
        }
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());

        let client = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(client_id = %client.id, "client updated");
        Ok(client)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_client(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<client::Model, ServiceError> {
        self.set_status(id, RecordStatus::Inactive, actor).await
    }

    #[instrument(skip(self))]
    pub async fn activate_client(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<client::Model, ServiceError> {
        let existing = self.get_client(id).await?;
        guards::active_company(&*self.db_pool, existing.company_id).await?;
        self.set_status(id, RecordStatus::Active, actor).await
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: RecordStatus,
        actor: Option<Uuid>,
    ) -> Result<client::Model, ServiceError> {
        let existing = self.get_client(id).await?;
        let mut active: client::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());
        let client = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(client_id = %client.id, status = ?client.status, "client status changed");
        Ok(client)
    }
}
