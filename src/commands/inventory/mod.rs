//! Stock movements. Every change to `quantity_on_hand` goes through
//! [`apply_stock_change`] so the ledger and the balance can't drift apart.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    events::Event,
    models::{inventory, inventory_transaction, ReferenceType},
};

mod adjust_inventory_command;

pub use adjust_inventory_command::{AdjustInventoryCommand, AdjustInventoryResult};

#[derive(Debug, Clone)]
pub struct StockChange {
    pub company_id: Uuid,
    pub sku_id: Uuid,
    pub delta: i32,
    pub reason: String,
    pub reference_type: ReferenceType,
    pub reference_id: Option<Uuid>,
    pub actor: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct StockMovement {
    pub inventory: inventory::Model,
    pub previous_quantity: i32,
    pub ledger_entry: inventory_transaction::Model,
}

impl StockMovement {
    /// True when this movement took stock from above the reorder level to
    /// at or below it.
    pub fn crossed_reorder_level(&self) -> bool {
        crossed_reorder_level(
            self.previous_quantity,
            self.inventory.quantity_on_hand,
            self.inventory.reorder_level,
        )
    }

    pub fn low_stock_event(&self) -> Option<Event> {
        self.crossed_reorder_level().then(|| Event::LowStock {
            inventory_id: self.inventory.id,
            sku_id: self.inventory.sku_id,
            quantity_on_hand: self.inventory.quantity_on_hand,
            reorder_level: self.inventory.reorder_level,
        })
    }
}

pub fn crossed_reorder_level(previous: i32, current: i32, reorder_level: i32) -> bool {
    previous > reorder_level && current <= reorder_level
}

/// Applies a signed delta to `(company, sku)` stock and appends a ledger row.
/// Creates the inventory row on first receipt; never lets stock go negative.
pub async fn apply_stock_change<C: ConnectionTrait>(
    conn: &C,
    change: StockChange,
) -> Result<StockMovement, ServiceError> {
    let now = Utc::now();
    let existing = inventory::Entity::find()
        .filter(inventory::Column::CompanyId.eq(change.company_id))
        .filter(inventory::Column::SkuId.eq(change.sku_id))
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let row = match existing {
        Some(row) => row,
        None => inventory::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(change.company_id),
            sku_id: Set(change.sku_id),
            quantity_on_hand: Set(0),
            reorder_level: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?,
    };

    let previous_quantity = row.quantity_on_hand;
    let new_quantity = previous_quantity
        .checked_add(change.delta)
        .ok_or_else(|| ServiceError::ValidationError("quantity overflow".to_string()))?;
    if new_quantity < 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "SKU {} has {} on hand, cannot remove {}",
            change.sku_id,
            previous_quantity,
            -change.delta
        )));
    }

    let mut active: inventory::ActiveModel = row.into();
    active.quantity_on_hand = Set(new_quantity);
    active.updated_at = Set(now);
    let inventory = active.update(conn).await.map_err(ServiceError::db_error)?;

    let ledger_entry = inventory_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        inventory_id: Set(inventory.id),
        quantity_change: Set(change.delta),
        balance_after: Set(new_quantity),
        reason: Set(change.reason),
        reference_type: Set(change.reference_type),
        reference_id: Set(change.reference_id),
        created_by: Set(change.actor),
        created_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;

    Ok(StockMovement {
        inventory,
        previous_quantity,
        ledger_entry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorder_crossing_only_fires_on_the_way_down() {
        assert!(crossed_reorder_level(12, 10, 10));
        assert!(crossed_reorder_level(12, 3, 10));
        assert!(!crossed_reorder_level(10, 8, 10));
        assert!(!crossed_reorder_level(5, 15, 10));
        assert!(!crossed_reorder_level(20, 11, 10));
    }
}
