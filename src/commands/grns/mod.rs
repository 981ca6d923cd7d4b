//! Goods-received notes and their effect on stock and PO status.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{
        inventory::{apply_stock_change, StockChange, StockMovement},
        purchaseorders::{check_receipt_capacity, receipt_totals},
    },
    errors::ServiceError,
    models::{grn, grn_item, purchase_order, purchase_order_item, PoStatus, RecordStatus, ReferenceType},
};

mod cancel_grn_command;
mod create_grn_command;
mod update_grn_items_command;

pub use cancel_grn_command::CancelGrnCommand;
pub use create_grn_command::CreateGrnCommand;
pub use update_grn_items_command::UpdateGrnItemsCommand;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GrnItemInput {
    pub purchase_order_item_id: Uuid,
    #[validate(range(min = 1))]
    pub received_quantity: i32,
    #[validate(range(min = 0))]
    pub accepted_quantity: i32,
    #[validate(range(min = 0))]
    pub rejected_quantity: i32,
}

impl GrnItemInput {
    fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        let booked = self.accepted_quantity.checked_add(self.rejected_quantity);
        if booked != Some(self.received_quantity) {
            return Err(ServiceError::ValidationError(format!(
                "item {}: received quantity {} must equal accepted {} + rejected {}",
                self.purchase_order_item_id,
                self.received_quantity,
                self.accepted_quantity,
                self.rejected_quantity
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GrnWithItems {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub grn: grn::Model,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<grn_item::Model>,
}

/// What a GRN write changed besides the GRN itself.
#[derive(Debug, Default)]
pub(crate) struct GrnSideEffects {
    pub movements: Vec<StockMovement>,
    pub po_status_change: Option<(PoStatus, PoStatus)>,
}

/// Rejects an empty GRN and any line where received != accepted + rejected.
pub fn validate_grn_lines(items: &[GrnItemInput]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "at least one item is required".to_string(),
        ));
    }
    items.iter().try_for_each(GrnItemInput::check)
}

/// Loads a PO that can still take receipts, holding a row lock so receipts
/// against one PO are checked and written one at a time.
pub(crate) async fn receivable_po<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: Uuid,
) -> Result<purchase_order::Model, ServiceError> {
    let po = purchase_order::Entity::find_by_id(purchase_order_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Purchase order", purchase_order_id))?;

    if po.status != RecordStatus::Active {
        return Err(ServiceError::InvalidOperation(format!(
            "purchase order {} is inactive",
            po.po_number
        )));
    }
    if po.po_status == PoStatus::Cancelled {
        return Err(ServiceError::InvalidOperation(format!(
            "purchase order {} is cancelled",
            po.po_number
        )));
    }
    Ok(po)
}

/// Validates `items` against the PO and the quantity already accepted by
/// other active GRNs, then inserts them for `grn_id`. Returns the saved rows.
pub(crate) async fn insert_checked_items<C: ConnectionTrait>(
    conn: &C,
    po: &purchase_order::Model,
    grn_id: Uuid,
    items: &[GrnItemInput],
) -> Result<Vec<grn_item::Model>, ServiceError> {
    let po_items: HashMap<Uuid, purchase_order_item::Model> = purchase_order_item::Entity::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(po.id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let mut requested: BTreeMap<Uuid, i64> = BTreeMap::new();
    for item in items {
        if !po_items.contains_key(&item.purchase_order_item_id) {
            return Err(ServiceError::ValidationError(format!(
                "item {} does not belong to purchase order {}",
                item.purchase_order_item_id, po.po_number
            )));
        }
        *requested.entry(item.purchase_order_item_id).or_default() +=
            i64::from(item.accepted_quantity);
    }

    let already = receipt_totals(conn, po.id, Some(grn_id)).await?;
    for (po_item_id, wanted) in &requested {
        let ordered = po_items
            .get(po_item_id)
            .map(|item| i64::from(item.quantity))
            .unwrap_or_default();
        let accepted = already.get(po_item_id).map(|t| t.accepted).unwrap_or_default();
        check_receipt_capacity(*po_item_id, ordered, accepted, *wanted)?;
    }

    let now = Utc::now();
    let mut saved = Vec::with_capacity(items.len());
    for item in items {
        let sku_id = po_items
            .get(&item.purchase_order_item_id)
            .map(|po_item| po_item.sku_id)
            .ok_or_else(|| ServiceError::not_found("Purchase order item", item.purchase_order_item_id))?;
        let row = grn_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            grn_id: Set(grn_id),
            purchase_order_item_id: Set(item.purchase_order_item_id),
            sku_id: Set(sku_id),
            received_quantity: Set(item.received_quantity),
            accepted_quantity: Set(item.accepted_quantity),
            rejected_quantity: Set(item.rejected_quantity),
            created_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?;
        saved.push(row);
    }
    Ok(saved)
}

/// Accepted quantity per SKU.
pub(crate) fn accepted_by_sku(items: &[grn_item::Model]) -> BTreeMap<Uuid, i64> {
    let mut totals = BTreeMap::new();
    for item in items {
        *totals.entry(item.sku_id).or_default() += i64::from(item.accepted_quantity);
    }
    totals
}

/// Per-SKU difference between two sets of GRN lines.
pub fn stock_deltas(
    before: &BTreeMap<Uuid, i64>,
    after: &BTreeMap<Uuid, i64>,
) -> BTreeMap<Uuid, i64> {
    let mut deltas = BTreeMap::new();
    for (sku, qty) in after {
        *deltas.entry(*sku).or_default() += qty;
    }
    for (sku, qty) in before {
        *deltas.entry(*sku).or_default() -= qty;
    }
    deltas.retain(|_, delta| *delta != 0);
    deltas
}

/// Applies per-SKU stock deltas for one GRN.
pub(crate) async fn move_stock<C: ConnectionTrait>(
    conn: &C,
    grn: &grn::Model,
    deltas: &BTreeMap<Uuid, i64>,
    reference_type: ReferenceType,
    actor: Option<Uuid>,
) -> Result<Vec<StockMovement>, ServiceError> {
    let mut movements = Vec::with_capacity(deltas.len());
    for (sku_id, delta) in deltas {
        let delta = i32::try_from(*delta)
            .map_err(|_| ServiceError::ValidationError("quantity out of range".to_string()))?;
        let movement = apply_stock_change(
            conn,
            StockChange {
                company_id: grn.company_id,
                sku_id: *sku_id,
                delta,
                reason: format!("{} {}", reference_type, grn.grn_number),
                reference_type,
                reference_id: Some(grn.id),
                actor,
            },
        )
        .await?;
        movements.push(movement);
    }
    Ok(movements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(received: i32, accepted: i32, rejected: i32) -> GrnItemInput {
        GrnItemInput {
            purchase_order_item_id: Uuid::new_v4(),
            received_quantity: received,
            accepted_quantity: accepted,
            rejected_quantity: rejected,
        }
    }

    #[test]
    fn lines_must_balance() {
        assert!(validate_grn_lines(&[line(10, 8, 2)]).is_ok());
        assert!(validate_grn_lines(&[line(10, 8, 1)]).is_err());
        assert!(validate_grn_lines(&[line(0, 0, 0)]).is_err());
        assert!(validate_grn_lines(&[line(5, -1, 6)]).is_err());
        assert!(validate_grn_lines(&[]).is_err());
        assert!(validate_grn_lines(&[line(5, i32::MAX, 1)]).is_err());
        assert!(validate_grn_lines(&[line(i32::MAX, i32::MAX, 0)]).is_ok());
    }

    #[test]
    fn deltas_net_out_per_sku() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let before = BTreeMap::from([(a, 10), (b, 5)]);
        let after = BTreeMap::from([(a, 7), (b, 5), (c, 3)]);

        let deltas = stock_deltas(&before, &after);
        assert_eq!(deltas.get(&a), Some(&-3));
        assert_eq!(deltas.get(&b), None);
        assert_eq!(deltas.get(&c), Some(&3));
    }
}
