use crate::{
    commands::{
        purchaseorders::{
            receipt_lines, CreatePurchaseOrderCommand, PurchaseOrderWithItems, ReceiptLine,
        },
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{grn, purchase_order, purchase_order_item, PoStatus, RecordStatus},
    services::{contains_ci, fetch_page, non_blank, Page},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Header fields of an open purchase order. Items are fixed once created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderRequest {
    #[validate(length(min = 1, max = 255))]
    pub supplier_name: Option<String>,
    pub po_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PurchaseOrderFilter {
    pub company_id: Option<Uuid>,
    pub po_status: Option<PoStatus>,
    pub status: Option<RecordStatus>,
    /// Matches the PO number or supplier name
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReceiptSummary {
    pub purchase_order_id: Uuid,
    pub po_number: String,
    pub po_status: PoStatus,
    pub lines: Vec<ReceiptLine>,
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    number_width: usize,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, number_width: usize) -> Self {
        Self {
            db_pool,
            event_sender,
            number_width,
        }
    }

    #[instrument(skip(self, command))]
    pub async fn create_purchase_order(
        &self,
        mut command: CreatePurchaseOrderCommand,
        actor: Option<Uuid>,
    ) -> Result<PurchaseOrderWithItems, ServiceError> {
        command.created_by = actor;
        command.number_width = self.number_width;
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_purchase_order(&self, id: Uuid) -> Result<PurchaseOrderWithItems, ServiceError> {
        let purchase_order = self.find(id).await?;
        let items = purchase_order_item::Entity::find()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(id))
            .order_by_asc(purchase_order_item::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(PurchaseOrderWithItems {
            purchase_order,
            items,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_purchase_orders(
        &self,
        filter: PurchaseOrderFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<purchase_order::Model>, ServiceError> {
        let mut query = purchase_order::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(purchase_order::Column::CompanyId.eq(company_id));
        }
        if let Some(po_status) = filter.po_status {
            query = query.filter(purchase_order::Column::PoStatus.eq(po_status));
        }
        if let Some(status) = filter.status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            query = query.filter(
                sea_orm::Condition::any()
                    .add(contains_ci(purchase_order::Column::PoNumber, term))
                    .add(contains_ci(purchase_order::Column::SupplierName, term)),
            );
        }
        let query = query
            .order_by_desc(purchase_order::Column::PoDate)
            .order_by_desc(purchase_order::Column::PoNumber);
        fetch_page(&self.db_pool, query, page, limit).await
    }

    /// Header changes are only allowed while nothing has been received.
    #[instrument(skip(self, request))]
    pub async fn update_purchase_order(
        &self,
        id: Uuid,
        request: UpdatePurchaseOrderRequest,
        actor: Option<Uuid>,
    ) -> Result<purchase_order::Model, ServiceError> {
        request.validate()?;
        let existing = self.find(id).await?;
        if existing.status != RecordStatus::Active || existing.po_status != PoStatus::Open {
            return Err(ServiceError::InvalidOperation(format!(
                "purchase order {} is {} and can no longer be edited",
                existing.po_number, existing.po_status
            )));
        }

        let po_date = request.po_date.unwrap_or(existing.po_date);
        let expected = request
            .expected_delivery_date
            .or(existing.expected_delivery_date);
        if matches!(expected, Some(expected) if expected < po_date) {
            return Err(ServiceError::ValidationError(
                "expected_delivery_date cannot be before po_date".to_string(),
            ));
        }

        let mut active: purchase_order::ActiveModel = existing.into();
        if let Some(supplier_name) = request.supplier_name {
            active.supplier_name = Set(supplier_name.trim().to_string());
        }
        active.po_date = Set(po_date);
        active.expected_delivery_date = Set(expected);
        if let Some(notes) = request.notes {
            active.notes = Set(non_blank(Some(notes)));
        }
        active.updated_by = Set(actor);
        active.updated_at = Set(Utc::now());

        let purchase_order = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(po_number = %purchase_order.po_number, "purchase order updated");
        Ok(purchase_order)
    }

    #[instrument(skip(self))]
    pub async fn cancel_purchase_order(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<purchase_order::Model, ServiceError> {
        let (purchase_order, old_status) = self
            .db_pool
            .transaction::<_, (purchase_order::Model, PoStatus), ServiceError>(|txn| {
                Box::pin(async move {
                    let existing = lock_po(txn, id).await?;
                    if existing.po_status == PoStatus::Cancelled {
                        return Err(ServiceError::InvalidOperation(format!(
                            "purchase order {} is already cancelled",
                            existing.po_number
                        )));
                    }
                    ensure_no_active_grns(txn, &existing).await?;

                    let old_status = existing.po_status;
                    let mut active: purchase_order::ActiveModel = existing.into();
                    active.po_status = Set(PoStatus::Cancelled);
                    active.updated_by = Set(actor);
                    active.updated_at = Set(Utc::now());
                    let purchase_order = active.update(txn).await.map_err(ServiceError::db_error)?;
                    Ok((purchase_order, old_status))
                })
            })
            .await
            .map_err(ServiceError::from)?;

        info!(po_number = %purchase_order.po_number, "purchase order cancelled");
        self.event_sender
            .send_or_log(Event::PurchaseOrderStatusChanged {
                purchase_order_id: purchase_order.id,
                old_status: old_status.to_string(),
                new_status: PoStatus::Cancelled.to_string(),
            })
            .await;
        Ok(purchase_order)
    }

    /// Soft delete; same precondition as cancelling.
    #[instrument(skip(self))]
    pub async fn deactivate_purchase_order(
        &self,
        id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<purchase_order::Model, ServiceError> {
        let purchase_order = self
            .db_pool
            .transaction::<_, purchase_order::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let existing = lock_po(txn, id).await?;
                    ensure_no_active_grns(txn, &existing).await?;

                    let mut active: purchase_order::ActiveModel = existing.into();
                    active.status = Set(RecordStatus::Inactive);
                    active.updated_by = Set(actor);
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(ServiceError::from)?;
        info!(po_number = %purchase_order.po_number, "purchase order deactivated");
        Ok(purchase_order)
    }

    #[instrument(skip(self))]
    pub async fn receipt_summary(&self, id: Uuid) -> Result<ReceiptSummary, ServiceError> {
        let purchase_order = self.find(id).await?;
        let lines = receipt_lines(&*self.db_pool, id).await?;
        Ok(ReceiptSummary {
            purchase_order_id: purchase_order.id,
            po_number: purchase_order.po_number,
            po_status: purchase_order.po_status,
            lines,
        })
    }

    async fn find(&self, id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        purchase_order::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Purchase order", id))
    }
}

/// The PO row, locked against concurrent GRN writes until the transaction ends.
async fn lock_po<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<purchase_order::Model, ServiceError> {
    purchase_order::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Purchase order", id))
}

async fn ensure_no_active_grns<C: ConnectionTrait>(
    conn: &C,
    po: &purchase_order::Model,
) -> Result<(), ServiceError> {
    let active_grns = grn::Entity::find()
        .filter(grn::Column::PurchaseOrderId.eq(po.id))
        .filter(grn::Column::Status.eq(RecordStatus::Active))
        .count(conn)
        .await
        .map_err(ServiceError::db_error)?;
    if active_grns > 0 {
        return Err(ServiceError::InvalidOperation(format!(
            "purchase order {} has {} active GRN(s); cancel them first",
            po.po_number, active_grns
        )));
    }
    Ok(())
}
