use crate::{
    commands::{
        grns::{CancelGrnCommand, CreateGrnCommand, GrnWithItems, UpdateGrnItemsCommand},
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{grn, grn_item, RecordStatus},
    services::{fetch_page, Page},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct GrnFilter {
    pub company_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
    pub status: Option<RecordStatus>,
}

/// Goods-received notes. Every write goes through a command so stock and
/// PO status move in the same transaction.
#[derive(Clone)]
pub struct GrnService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    number_width: usize,
}

impl GrnService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, number_width: usize) -> Self {
        Self {
            db_pool,
            event_sender,
            number_width,
        }
    }

    #[instrument(skip(self, command), fields(purchase_order_id = %command.purchase_order_id))]
    pub async fn create_grn(
        &self,
        mut command: CreateGrnCommand,
        actor: Option<Uuid>,
    ) -> Result<GrnWithItems, ServiceError> {
        command.created_by = actor;
        command.number_width = self.number_width;
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_grn(
        &self,
        grn_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<grn::Model, ServiceError> {
        CancelGrnCommand {
            grn_id,
            cancelled_by: actor,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    #[instrument(skip(self, command))]
    pub async fn update_grn_items(
        &self,
        grn_id: Uuid,
        mut command: UpdateGrnItemsCommand,
        actor: Option<Uuid>,
    ) -> Result<GrnWithItems, ServiceError> {
        command.grn_id = grn_id;
        command.updated_by = actor;
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_grn(&self, id: Uuid) -> Result<GrnWithItems, ServiceError> {
        let grn = grn::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("GRN", id))?;
        let items = grn_item::Entity::find()
            .filter(grn_item::Column::GrnId.eq(id))
            .order_by_asc(grn_item::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(GrnWithItems { grn, items })
    }

    #[instrument(skip(self))]
    pub async fn list_grns(
        &self,
        filter: GrnFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<grn::Model>, ServiceError> {
        let mut query = grn::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(grn::Column::CompanyId.eq(company_id));
        }
        if let Some(purchase_order_id) = filter.purchase_order_id {
            query = query.filter(grn::Column::PurchaseOrderId.eq(purchase_order_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(grn::Column::Status.eq(status));
        }
        let query = query
            .order_by_desc(grn::Column::GrnDate)
            .order_by_desc(grn::Column::GrnNumber);
        fetch_page(&self.db_pool, query, page, limit).await
    }
}
