use crate::{
    commands::guards,
    db::DbPool,
    documents::{next_document_number, DocumentPrefix},
    errors::ServiceError,
    models::{sku, RecordStatus},
    services::{contains_ci, fetch_page, non_blank, Page},
    validation::{non_negative_decimal, positive_decimal, valid_ply},
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

/// A box definition: ply plus inner dimensions in millimetres.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSkuRequest {
    pub company_id: Uuid,
    /// Client the box is made for, if it is client-specific
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "valid_ply")]
    #[schema(example = 5)]
    pub ply: i32,
    #[validate(custom = "positive_decimal")]
    #[schema(value_type = String, example = "300")]
    pub length_mm: Decimal,
    #[validate(custom = "positive_decimal")]
    #[schema(value_type = String, example = "200")]
    pub width_mm: Decimal,
    #[validate(custom = "positive_decimal")]
    #[schema(value_type = String, example = "150")]
    pub height_mm: Decimal,
    #[validate(custom = "non_negative_decimal")]
    #[serde(default)]
    #[schema(value_type = String, example = "42.50")]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSkuRequest {
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "valid_ply")]
    pub ply: Option<i32>,
    #[validate(custom = "positive_decimal")]
    #[schema(value_type = Option<String>)]
    pub length_mm: Option<Decimal>,
    #[validate(custom = "positive_decimal")]
    #[schema(value_type = Option<String>)]
    pub width_mm: Option<Decimal>,
    #[validate(custom = "positive_decimal")]
    #[schema(value_type = Option<String>)]
    pub height_mm: Option<Decimal>,
    #[validate(custom = "non_negative_decimal")]
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SkuFilter {
    pub company_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    /// Matches the SKU name or code
    pub search: Option<String>,
    pub status: Option<RecordStatus>,
}

#[derive(Clone)]
pub struct SkuService {
    db_pool: Arc<DbPool>,
    number_width: usize,
}

impl SkuService {
    pub fn new(db_pool: Arc<DbPool>, number_width: usize) -> Self {
        Self {
            db_pool,
            number_width,
        }
    }

    #[instrument(skip(self, request), fields(company_id = %request.company_id))]
    pub async fn create_sku(
        &self,
        request: CreateSkuRequest,
        actor: Option<Uuid>,
    ) -> Result<sku::Model, ServiceError> {
        request.validate()?;
        let width = self.number_width;

        let sku = self
            .db_pool
            .transaction::<_, sku::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    guards::active_company(txn, request.company_id).await?;
                    if let Some(client_id) = request.client_id {
                        guards::company_client(txn, request.company_id, client_id).await?;
                    }
                    let sku_code =
                        next_document_number(txn, request.company_id, DocumentPrefix::Sku, width)
                            .await?;

                    let now = Utc::now();
                    sku::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        company_id: Set(request.company_id),
                        client_id: Set(request.client_id),
                        sku_code: Set(sku_code),
                        name: Set(request.name.trim().to_string()),
                        description: Set(non_blank(request.description)),
                        ply: Set(request.ply),
                        length_mm: Set(request.length_mm),
                        width_mm: Set(request.width_mm),
                        height_mm: Set(request.height_mm),
                        unit_price: Set(request.unit_price.round_dp(2)),
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

        info!(sku_id = %sku.id, sku_code = %sku.sku_code, "SKU created");
        Ok(sku)
    }

    #[instrument(skip(self))]
    pub async fn get_sku(&self, id: Uuid) -> Result<sku::Model, ServiceError> {
        sku::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("SKU", id))
    }

    #[instrument(skip(self))]
    pub async fn list_skus(
        &self,
        filter: SkuFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<sku::Model>, ServiceError> {
        let mut query = sku::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(sku::Column::CompanyId.eq(company_id));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(sku::Column::ClientId.eq(client_id));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(sku::Column::Name, term))
                    .add(contains_ci(sku::Column::SkuCode, term)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(sku::Column::Status.eq(status));
        }
        let query = query.order_by_asc(sku::Column::SkuCode);
        fetch_page(&self.db_pool, query, page, limit).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_sku(
        &self,
        id: Uuid,
        request: UpdateSkuRequest,
        actor: Option<Uuid>,
    ) -> Result<sku::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_sku(id).await?;
        if let Some(client_id) = request.client_id {
            guards::company_client(&*self.db_pool, existing.company_id, client_id).await?;
        }

        let mut active: sku::ActiveModel = existing.into();
        if request.client_id.is_some() {
            active.client_id = Set(request.client_id);
        }
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(non_blank(Some(description)));
        }
        if let Some(ply) = request.ply {
            active.ply = Set(ply);
        }
        if let Some(length_mm) = request.length_mm {
            active.length_mm = Set(length_mm);
        }
        if let Some(width_mm) = request.width_mm {
            active.width_mm = Set(width_mm);
        }
        if let Some(height_mm) = request.height_mm {
            active.height_mm = Set(height_mm);
        }
        if let Some(unit_price) = request.unit_price {
            active.unit_price = Set(unit_price.round_dp(2));
        }
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());

        let sku = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(sku_id = %sku.id, "SKU updated");
        Ok(sku)
    }

    #[instrument(skip(self))]
    pub async fn deactivate_sku(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<sku::Model, ServiceError> {
        let existing = self.get_sku(id).await?;
        let mut active: sku::ActiveModel = existing.into();
        active.status = Set(RecordStatus::Inactive);
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());
        let sku = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(sku_id = %sku.id, "SKU deactivated");
        Ok(sku)
    }
}
