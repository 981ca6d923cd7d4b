use crate::{
    commands::{
        inventory::{AdjustInventoryCommand, AdjustInventoryResult},
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{inventory, inventory_transaction},
    services::{fetch_page, Page},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct InventoryFilter {
    pub company_id: Option<Uuid>,
    pub sku_id: Option<Uuid>,
    /// Only rows at or below their reorder level
    #[serde(default)]
    pub low_stock_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SetReorderLevelRequest {
    #[validate(range(min = 0))]
    pub reorder_level: i32,
}

/// Stock on hand per (company, SKU) and its ledger.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_inventory(&self, id: Uuid) -> Result<inventory::Model, ServiceError> {
        inventory::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Inventory", id))
    }

    #[instrument(skip(self))]
    pub async fn get_by_sku(
        &self,
        company_id: Uuid,
        sku_id: Uuid,
    ) -> Result<inventory::Model, ServiceError> {
        inventory::Entity::find()
            .filter(inventory::Column::CompanyId.eq(company_id))
            .filter(inventory::Column::SkuId.eq(sku_id))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "no inventory for SKU {} in company {}",
                    sku_id, company_id
                ))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_inventory(
        &self,
        filter: InventoryFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<inventory::Model>, ServiceError> {
        let mut query = inventory::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(inventory::Column::CompanyId.eq(company_id));
        }
        if let Some(sku_id) = filter.sku_id {
            query = query.filter(inventory::Column::SkuId.eq(sku_id));
        }
        if filter.low_stock_only {
            query = query.filter(
                Expr::col(inventory::Column::QuantityOnHand)
                    .lte(Expr::col(inventory::Column::ReorderLevel)),
            );
        }
        let query = query.order_by_desc(inventory::Column::UpdatedAt);
        fetch_page(&self.db_pool, query, page, limit).await
    }

    /// Rows at or below their reorder level, lowest stock first.
    #[instrument(skip(self))]
    pub async fn low_stock(
        &self,
        company_id: Option<Uuid>,
    ) -> Result<Vec<inventory::Model>, ServiceError> {
        let mut query = inventory::Entity::find().filter(
            Expr::col(inventory::Column::QuantityOnHand)
                .lte(Expr::col(inventory::Column::ReorderLevel)),
        );
        if let Some(company_id) = company_id {
            query = query.filter(inventory::Column::CompanyId.eq(company_id));
        }
        query
            .order_by_asc(inventory::Column::QuantityOnHand)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, command), fields(sku_id = %command.sku_id))]
    pub async fn adjust_inventory(
        &self,
        mut command: AdjustInventoryCommand,
        actor: Option<Uuid>,
    ) -> Result<AdjustInventoryResult, ServiceError> {
        command.created_by = actor;
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn set_reorder_level(
        &self,
        id: Uuid,
        request: SetReorderLevelRequest,
    ) -> Result<inventory::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_inventory(id).await?;
        let mut active: inventory::ActiveModel = existing.into();
        active.reorder_level = Set(request.reorder_level);
        active.updated_at = Set(Utc::now());
        let row = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(
            inventory_id = %row.id,
            reorder_level = row.reorder_level,
            low_stock = row.is_low_stock(),
            "reorder level set"
        );
        Ok(row)
    }

    /// Ledger rows for one inventory row, newest first.
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<Page<inventory_transaction::Model>, ServiceError> {
        self.get_inventory(id).await?;
        let query = inventory_transaction::Entity::find()
            .filter(inventory_transaction::Column::InventoryId.eq(id))
            .order_by_desc(inventory_transaction::Column::CreatedAt)
            .order_by_desc(inventory_transaction::Column::Id);
        fetch_page(&self.db_pool, query, page, limit).await
    }
}
