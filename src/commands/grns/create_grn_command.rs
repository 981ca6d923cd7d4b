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
    documents::{next_document_number, DocumentPrefix},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{grn, RecordStatus, ReferenceType},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Posts a GRN against a purchase order and moves the accepted goods into
/// stock.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateGrnCommand {
    pub purchase_order_id: Uuid,
    /// Defaults to today.
    pub grn_date: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub received_by: Option<String>,
    #[validate(length(max = 64))]
    pub vehicle_number: Option<String>,
    #[validate(length(max = 128))]
    pub invoice_reference: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub items: Vec<GrnItemInput>,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
    #[serde(skip, default = "crate::commands::default_number_width")]
    pub number_width: usize,
}

#[async_trait::async_trait]
impl Command for CreateGrnCommand {
    type Result = GrnWithItems;

    #[instrument(skip(self, db_pool, event_sender), fields(purchase_order_id = %self.purchase_order_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (result, effects) = self.post_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("create_grn", &e);
            e
        })?;
        metrics::GRNS_POSTED.inc();

        let accepted_quantity: i64 = result
            .items
            .iter()
            .map(|item| i64::from(item.accepted_quantity))
            .sum();
        info!(
            grn_id = %result.grn.id,
            grn_number = %result.grn.grn_number,
            accepted_quantity,
            "GRN posted"
        );

        event_sender
            .send_or_log(Event::GrnPosted {
                grn_id: result.grn.id,
                purchase_order_id: result.grn.purchase_order_id,
                accepted_quantity,
            })
            .await;
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

impl CreateGrnCommand {
    async fn post_in_db(
        &self,
        db: &DbPool,
    ) -> Result<(GrnWithItems, GrnSideEffects), ServiceError> {
        self.validate()?;
        validate_grn_lines(&self.items)?;

        let command = self.clone();
        db.transaction::<_, (GrnWithItems, GrnSideEffects), ServiceError>(|txn| {
            Box::pin(async move {
                let po = receivable_po(txn, command.purchase_order_id).await?;
                let grn_number = next_document_number(
                    txn,
                    po.company_id,
                    DocumentPrefix::Grn,
                    command.number_width,
                )
                .await?;

                let now = Utc::now();
                let grn = grn::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    company_id: Set(po.company_id),
                    purchase_order_id: Set(po.id),
                    grn_number: Set(grn_number),
                    grn_date: Set(command.grn_date.unwrap_or_else(|| now.date_naive())),
                    received_by: Set(command.received_by.clone()),
                    vehicle_number: Set(command.vehicle_number.clone()),
                    invoice_reference: Set(command.invoice_reference.clone()),
                    notes: Set(command.notes.clone()),
                    status: Set(RecordStatus::Active),
                    created_by: Set(command.created_by),
                    updated_by: Set(command.created_by),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await
                .map_err(ServiceError::db_error)?;

                let items = insert_checked_items(txn, &po, grn.id, &command.items).await?;
                let movements = move_stock(
                    txn,
                    &grn,
                    &stock_deltas(&BTreeMap::new(), &accepted_by_sku(&items)),
                    ReferenceType::Grn,
                    command.created_by,
                )
                .await?;
                let po_status_change = refresh_po_status(txn, po.id, command.created_by).await?;

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
