use crate::{
    commands::{
        grns::{accepted_by_sku, move_stock, stock_deltas, GrnSideEffects},
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
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, instrument};
use uuid::Uuid;

/// Soft-deletes a GRN and takes its accepted goods back out of stock.
#[derive(Debug, Clone)]
pub struct CancelGrnCommand {
    pub grn_id: Uuid,
    pub cancelled_by: Option<Uuid>,
}

#[async_trait::async_trait]
impl Command for CancelGrnCommand {
    type Result = grn::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(grn_id = %self.grn_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (grn, effects) = self.cancel_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("cancel_grn", &e);
            e
        })?;
        metrics::GRNS_CANCELLED.inc();
        info!(grn_number = %grn.grn_number, "GRN cancelled");

        event_sender
            .send_or_log(Event::GrnCancelled {
                grn_id: grn.id,
                purchase_order_id: grn.purchase_order_id,
            })
            .await;
        if let Some((old, new)) = effects.po_status_change {
            event_sender
                .send_or_log(Event::PurchaseOrderStatusChanged {
                    purchase_order_id: grn.purchase_order_id,
                    old_status: old.to_string(),
                    new_status: new.to_string(),
                })
                .await;
        }
        for event in effects.movements.iter().filter_map(|m| m.low_stock_event()) {
            event_sender.send_or_log(event).await;
        }

        Ok(grn)
    }
}

impl CancelGrnCommand {
    async fn cancel_in_db(&self, db: &DbPool) -> Result<(grn::Model, GrnSideEffects), ServiceError> {
        let grn_id = self.grn_id;
        let actor = self.cancelled_by;

        db.transaction::<_, (grn::Model, GrnSideEffects), ServiceError>(|txn| {
            Box::pin(async move {
                let grn = grn::Entity::find_by_id(grn_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| ServiceError::not_found("GRN", grn_id))?;
                if grn.status != RecordStatus::Active {
                    return Err(ServiceError::InvalidOperation(format!(
                        "GRN {} is already cancelled",
                        grn.grn_number
                    )));
                }

                let items = grn_item::Entity::find()
                    .filter(grn_item::Column::GrnId.eq(grn_id))
                    .all(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                let mut active: grn::ActiveModel = grn.into();
                active.status = Set(RecordStatus::Inactive);
                active.updated_by = Set(actor);
                active.updated_at = Set(Utc::now());
                let grn = active.update(txn).await.map_err(ServiceError::db_error)?;

                let deltas = stock_deltas(&accepted_by_sku(&items), &BTreeMap::new());
                let movements =
                    move_stock(txn, &grn, &deltas, ReferenceType::GrnCancel, actor).await?;
                let po_status_change = refresh_po_status(txn, grn.purchase_order_id, actor).await?;

                Ok((
                    grn,
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
