//! Purchase-order receipt accounting.
//!
//! Accepted quantities are never stored on the PO item itself; they are
//! summed over the items of active GRNs whenever they are needed, so
//! cancelling or editing a GRN can't leave a stale counter behind.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QuerySelect,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::{grn, grn_item, purchase_order, purchase_order_item, PoStatus, RecordStatus},
};

mod create_purchase_order_command;

pub use create_purchase_order_command::{
    CreatePurchaseOrderCommand, PurchaseOrderItemInput, PurchaseOrderWithItems,
};

/// Accepted/rejected totals for one PO item over active GRNs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiptTotals {
    pub accepted: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReceiptLine {
    pub purchase_order_item_id: Uuid,
    pub sku_id: Uuid,
    pub ordered: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub pending: i64,
}

/// Status implied by how much of each line has been accepted.
pub fn derive_po_status(current: PoStatus, lines: &[(i64, i64)]) -> PoStatus {
    if current == PoStatus::Cancelled {
        return PoStatus::Cancelled;
    }
    let any_accepted = lines.iter().any(|(_, accepted)| *accepted > 0);
    let all_complete = !lines.is_empty() && lines.iter().all(|(ordered, accepted)| accepted >= ordered);

    if all_complete {
        PoStatus::Received
    } else if any_accepted {
        PoStatus::PartiallyReceived
    } else {
        PoStatus::Open
    }
}

/// Rejects a receipt that would take the accepted total past the ordered
/// quantity.
pub fn check_receipt_capacity(
    purchase_order_item_id: Uuid,
    ordered: i64,
    already_accepted: i64,
    requested: i64,
) -> Result<(), ServiceError> {
    if already_accepted + requested > ordered {
        return Err(ServiceError::Conflict(format!(
            "accepted quantity for item {} would exceed ordered quantity (ordered {}, already accepted {}, requested {})",
            purchase_order_item_id, ordered, already_accepted, requested
        )));
    }
    Ok(())
}

/// Sums accepted and rejected quantities per PO item across the PO's active
/// GRNs, optionally leaving one GRN out.
pub async fn receipt_totals<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: Uuid,
    excluding_grn: Option<Uuid>,
) -> Result<HashMap<Uuid, ReceiptTotals>, ServiceError> {
    let mut grns = grn::Entity::find()
        .select_only()
        .column(grn::Column::Id)
        .filter(grn::Column::PurchaseOrderId.eq(purchase_order_id))
        .filter(grn::Column::Status.eq(RecordStatus::Active));
    if let Some(excluded) = excluding_grn {
        grns = grns.filter(grn::Column::Id.ne(excluded));
    }
    let grn_ids: Vec<Uuid> = grns
        .into_tuple()
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut totals: HashMap<Uuid, ReceiptTotals> = HashMap::new();
    if grn_ids.is_empty() {
        return Ok(totals);
    }

    let items = grn_item::Entity::find()
        .filter(grn_item::Column::GrnId.is_in(grn_ids))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    for item in items {
        let entry = totals.entry(item.purchase_order_item_id).or_default();
        entry.accepted += i64::from(item.accepted_quantity);
        entry.rejected += i64::from(item.rejected_quantity);
    }
    Ok(totals)
}

/// Per-line receipt summary for a purchase order.
pub async fn receipt_lines<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: Uuid,
) -> Result<Vec<ReceiptLine>, ServiceError> {
    let items = purchase_order_item::Entity::find()
        .filter(purchase_order_item::Column::PurchaseOrderId.eq(purchase_order_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;
    let totals = receipt_totals(conn, purchase_order_id, None).await?;

    Ok(items
        .into_iter()
        .map(|item| {
            let t = totals.get(&item.id).copied().unwrap_or_default();
            let ordered = i64::from(item.quantity);
            ReceiptLine {
                purchase_order_item_id: item.id,
                sku_id: item.sku_id,
                ordered,
                accepted: t.accepted,
                rejected: t.rejected,
                pending: ordered - t.accepted,
            }
        })
        .collect())
}

/// Recomputes and stores `po_status`. Returns `(old, new)` when it changed.
pub async fn refresh_po_status<C: ConnectionTrait>(
    conn: &C,
    purchase_order_id: Uuid,
    actor: Option<Uuid>,
) -> Result<Option<(PoStatus, PoStatus)>, ServiceError> {
    let po = purchase_order::Entity::find_by_id(purchase_order_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Purchase order", purchase_order_id))?;

    let lines: Vec<(i64, i64)> = receipt_lines(conn, purchase_order_id)
        .await?
        .iter()
        .map(|line| (line.ordered, line.accepted))
        .collect();

    let old = po.po_status;
    let new = derive_po_status(old, &lines);
    if new == old {
        return Ok(None);
    }

    let mut active: purchase_order::ActiveModel = po.into();
    active.po_status = Set(new);
    active.updated_by = Set(actor);
    active.updated_at = Set(Utc::now());
    active.update(conn).await.map_err(ServiceError::db_error)?;
    Ok(Some((old, new)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case(PoStatus::Open, &[(10, 0), (5, 0)], PoStatus::Open)]
    #[case(PoStatus::Open, &[(10, 4), (5, 0)], PoStatus::PartiallyReceived)]
    #[case(PoStatus::PartiallyReceived, &[(10, 10), (5, 5)], PoStatus::Received)]
    #[case(PoStatus::Received, &[(10, 6), (5, 5)], PoStatus::PartiallyReceived)]
    #[case(PoStatus::PartiallyReceived, &[(10, 0), (5, 0)], PoStatus::Open)]
    #[case(PoStatus::Cancelled, &[(10, 10)], PoStatus::Cancelled)]
    fn po_status_follows_acceptance(
        #[case] current: PoStatus,
        #[case] lines: &[(i64, i64)],
        #[case] expected: PoStatus,
    ) {
        assert_eq!(derive_po_status(current, lines), expected);
    }

    #[test]
    fn capacity_allows_exact_fill() {
        assert!(check_receipt_capacity(Uuid::new_v4(), 100, 80, 20).is_ok());
    }

    #[test]
    fn capacity_conflict_names_the_numbers() {
        let item = Uuid::new_v4();
        let err = check_receipt_capacity(item, 100, 80, 30).unwrap_err();
        assert_matches!(&err, ServiceError::Conflict(msg) => {
            assert!(msg.contains(&item.to_string()));
            assert!(msg.contains("ordered 100"));
            assert!(msg.contains("already accepted 80"));
            assert!(msg.contains("requested 30"));
        });
    }
}
