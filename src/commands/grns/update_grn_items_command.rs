use crate::{
    commands::{
        grns::{
            accepted_by_sku, insert_checked_items, move_stock, receivable_po, stock_deltas,
            validate_grn_lines, GrnItemInput, GrnSideEffects, GrnWithItems,
        },
        purchaseorders::refresh_po_status,
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{grn, grn_item, RecordStatus, ReferenceType},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Replaces the lines of an active GRN. Stock moves by the per-SKU
/// difference between the old and new accepted quantities.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateGrnItemsCommand {
    #[serde(skip)]
    pub grn_id: Uuid,
    pub items: Vec<GrnItemInput>,
    #[serde(skip)]
    pub updated_by: Option<Uuid>,
}

#[async_trait::async_trait]
impl Command for UpdateGrnItemsCommand {
    type Result = GrnWithItems;

    #[instrument(skip(self, db_pool, event_sender), fields(grn_id = %self.grn_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (result, effects) = self.update_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("update_grn_items", &e);
            e
        })?;
        info!(
            grn_number = %result.grn.grn_number,
            stock_movements = effects.movements.len(),
            "GRN items updated"
        );

        if let Some((old, new)) = effects.po_status_change {
            event_sender
                .send_or_log(Event::PurchaseOrderStatusChanged {
                    purchase_order_id: result.grn.purchase_order_id,
                    old_status: old.to_string(),
                    new_status: new.to_string(),
                })
                .await;
        }
        for event in effects.movements.iter().filter_map(|m| m.low_stock_event()) {
            event_sender.send_or_log(event).await;
        }

        Ok(result)
    }
}

impl UpdateGrnItemsCommand {
    async fn update_in_db(
        &self,
        db: &DbPool,
    ) -> Result<(GrnWithItems, GrnSideEffects), ServiceError> {
        validate_grn_lines(&self.items)?;

        let command = self.clone();
        db.transaction::<_, (GrnWithItems, GrnSideEffects), ServiceError>(|txn| {
            Box::pin(async move {
                let grn = grn::Entity::find_by_id(command.grn_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| ServiceError::not_found("GRN", command.grn_id))?;
                if grn.status != RecordStatus::Active {
                    return Err(ServiceError::InvalidOperation(format!(
                        "GRN {} is cancelled and cannot be edited",
                        grn.grn_number
                    )));
                }
                let po = receivable_po(txn, grn.purchase_order_id).await?;

                let old_items = grn_item::Entity::find()
                    .filter(grn_item::Column::GrnId.eq(grn.id))
                    .all(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                grn_item::Entity::delete_many()
                    .filter(grn_item::Column::GrnId.eq(grn.id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                let items = insert_checked_items(txn, &po, grn.id, &command.items).await?;

                let mut active: grn::ActiveModel = grn.into();
                active.updated_by = Set(command.updated_by);
                active.updated_at = Set(Utc::now());
                let grn = active.update(txn).await.map_err(ServiceError::db_error)?;

                let deltas = stock_deltas(&accepted_by_sku(&old_items), &accepted_by_sku(&items));
                let movements =
                    move_stock(txn, &grn, &deltas, ReferenceType::GrnUpdate, command.updated_by)
                        .await?;
                let po_status_change = refresh_po_status(txn, po.id, command.updated_by).await?;

                Ok((
                    GrnWithItems { grn, items },
                    GrnSideEffects {
                        movements,
                        po_status_change,
                    },
                ))
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
