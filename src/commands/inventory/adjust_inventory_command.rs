use crate::{
    commands::{
        guards,
        inventory::{apply_stock_change, StockChange},
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{inventory, inventory_transaction, ReferenceType},
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Manual stock correction (count differences, damage, consumption).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdjustInventoryCommand {
    pub company_id: Uuid,
    pub sku_id: Uuid,
    /// Signed; negative removes stock.
    pub quantity_change: i32,
    #[validate(length(min = 1, max = 255))]
    pub reason: String,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdjustInventoryResult {
    #[schema(value_type = Object)]
    pub inventory: inventory::Model,
    pub previous_quantity: i32,
    #[schema(value_type = Object)]
    pub transaction: inventory_transaction::Model,
}

#[async_trait::async_trait]
impl Command for AdjustInventoryCommand {
    type Result = AdjustInventoryResult;

    #[instrument(skip(self, db_pool, event_sender), fields(sku_id = %self.sku_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let movement = self.adjust_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("adjust_inventory", &e);
            e
        })?;
        metrics::INVENTORY_ADJUSTMENTS.inc();

        info!(
            inventory_id = %movement.inventory.id,
            previous = movement.previous_quantity,
            new = movement.inventory.quantity_on_hand,
            reason = %self.reason,
            "inventory adjusted"
        );

        event_sender
            .send_or_log(Event::InventoryAdjusted {
                inventory_id: movement.inventory.id,
                sku_id: movement.inventory.sku_id,
                old_quantity: movement.previous_quantity,
                new_quantity: movement.inventory.quantity_on_hand,
                reason: self.reason.clone(),
            })
            .await;
        if let Some(event) = movement.low_stock_event() {
            event_sender.send_or_log(event).await;
        }

        Ok(AdjustInventoryResult {
            inventory: movement.inventory,
            previous_quantity: movement.previous_quantity,
            transaction: movement.ledger_entry,
        })
    }
}

impl AdjustInventoryCommand {
    async fn adjust_in_db(
        &self,
        db: &DbPool,
    ) -> Result<super::StockMovement, ServiceError> {
        self.validate()?;
        if self.quantity_change == 0 {
            return Err(ServiceError::ValidationError(
                "quantity_change must not be zero".to_string(),
            ));
        }

        let change = StockChange {
            company_id: self.company_id,
            sku_id: self.sku_id,
            delta: self.quantity_change,
            reason: self.reason.trim().to_string(),
            reference_type: ReferenceType::Adjustment,
            reference_id: None,
            actor: self.created_by,
        };

        db.transaction::<_, super::StockMovement, ServiceError>(|txn| {
            Box::pin(async move {
                guards::company_sku(txn, change.company_id, change.sku_id).await?;
                apply_stock_change(txn, change).await
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
