//! Invoice arithmetic and the balance refresh shared by payments and
//! credit notes.
//!
//! `paid_amount`, `credited_amount`, `balance_amount` and `payment_status`
//! are recomputed from the active payment and credit-note rows on every
//! change instead of being adjusted incrementally.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    commands::{checked_total, line_amount},
    errors::ServiceError,
    models::{credit_note, partial_payment, work_order_invoice, PaymentStatus, RecordStatus},
    validation::non_negative_decimal,
};

mod cancel_invoice_command;
mod create_invoice_command;

pub use cancel_invoice_command::CancelInvoiceCommand;
pub use create_invoice_command::{CreateInvoiceCommand, InvoiceWithItems};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InvoiceItemInput {
    pub sku_id: Option<Uuid>,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(custom = "non_negative_decimal")]
    #[schema(value_type = String, example = "18.75")]
    pub rate: Decimal,
}

impl InvoiceItemInput {
    pub fn amount(&self) -> Result<Decimal, ServiceError> {
        line_amount(self.quantity, self.rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub sub_total: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

pub fn compute_totals(
    items: &[InvoiceItemInput],
    tax_rate: Decimal,
) -> Result<InvoiceTotals, ServiceError> {
    let amounts = items
        .iter()
        .map(InvoiceItemInput::amount)
        .collect::<Result<Vec<_>, _>>()?;
    let sub_total = checked_total(amounts)?;
    let tax_amount = sub_total
        .checked_mul(tax_rate)
        .map(|taxed| (taxed / Decimal::ONE_HUNDRED).round_dp(2))
        .ok_or_else(|| ServiceError::ValidationError("amount is too large".to_string()))?;
    Ok(InvoiceTotals {
        sub_total,
        tax_amount,
        total_amount: checked_total([sub_total, tax_amount])?,
    })
}

pub fn derive_payment_status(balance: Decimal, paid: Decimal, credited: Decimal) -> PaymentStatus {
    if balance <= Decimal::ZERO {
        PaymentStatus::Paid
    } else if paid > Decimal::ZERO || credited > Decimal::ZERO {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Unpaid
    }
}

/// Loads an invoice that can still take payments or credit notes, holding
/// a row lock for the rest of the transaction.
pub async fn open_invoice<C: ConnectionTrait>(
    conn: &C,
    invoice_id: Uuid,
) -> Result<work_order_invoice::Model, ServiceError> {
    let invoice = work_order_invoice::Entity::find_by_id(invoice_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found("Invoice", invoice_id))?;

    if invoice.status != RecordStatus::Active {
        return Err(ServiceError::InvalidOperation(format!(
            "invoice {} is cancelled",
            invoice.invoice_number
        )));
    }
    Ok(invoice)
}

/// Rejects an amount larger than what is still owed.
pub fn check_within_balance(
    invoice: &work_order_invoice::Model,
    amount: Decimal,
) -> Result<(), ServiceError> {
    if amount > invoice.balance_amount {
        return Err(ServiceError::InvalidOperation(format!(
            "amount {} exceeds outstanding balance {} on invoice {}",
            amount, invoice.balance_amount, invoice.invoice_number
        )));
    }
    Ok(())
}

/// Recomputes the derived amounts of `invoice` from its active payments and
/// credit notes and writes them back.
pub async fn refresh_invoice_balance<C: ConnectionTrait>(
    conn: &C,
    invoice: work_order_invoice::Model,
    actor: Option<Uuid>,
) -> Result<work_order_invoice::Model, ServiceError> {
    let payments: Vec<Decimal> = partial_payment::Entity::find()
        .select_only()
        .column(partial_payment::Column::Amount)
        .filter(partial_payment::Column::InvoiceId.eq(invoice.id))
        .filter(partial_payment::Column::Status.eq(RecordStatus::Active))
        .into_tuple()
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;
    let credits: Vec<Decimal> = credit_note::Entity::find()
        .select_only()
        .column(credit_note::Column::Amount)
        .filter(credit_note::Column::InvoiceId.eq(invoice.id))
        .filter(credit_note::Column::Status.eq(RecordStatus::Active))
        .into_tuple()
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let paid: Decimal = payments.into_iter().sum::<Decimal>().round_dp(2);
    let credited: Decimal = credits.into_iter().sum::<Decimal>().round_dp(2);
    let balance = (invoice.total_amount - paid - credited).round_dp(2);
    if balance < Decimal::ZERO {
        return Err(ServiceError::InvalidOperation(format!(
            "invoice {} would be overpaid by {}",
            invoice.invoice_number, -balance
        )));
    }

    let mut active: work_order_invoice::ActiveModel = invoice.into();
    active.paid_amount = Set(paid);
    active.credited_amount = Set(credited);
    active.balance_amount = Set(balance);
    active.payment_status = Set(derive_payment_status(balance, paid, credited));
    active.updated_by = Set(actor);
    active.updated_at = Set(Utc::now());
    active.update(conn).await.map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn line(quantity: i32, rate: Decimal) -> InvoiceItemInput {
        InvoiceItemInput {
            sku_id: None,
            description: "RSC box".into(),
            quantity,
            rate,
        }
    }

    #[test]
    fn totals_round_tax_to_paise() {
        let totals = compute_totals(&[line(3, dec!(10.333)), line(1, dec!(5))], dec!(18))
            .expect("totals");
        assert_eq!(totals.sub_total, dec!(36.00));
        assert_eq!(totals.tax_amount, dec!(6.48));
        assert_eq!(totals.total_amount, dec!(42.48));
    }

    #[test]
    fn zero_tax_keeps_sub_total() {
        let totals = compute_totals(&[line(10, dec!(2.5))], Decimal::ZERO).expect("totals");
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, dec!(25.0));
    }

    #[test]
    fn oversized_rates_are_rejected_not_panicking() {
        let result = compute_totals(&[line(1000, Decimal::MAX)], Decimal::ZERO);
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));

        let result = compute_totals(&[line(1, Decimal::MAX)], dec!(18));
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[rstest]
    #[case(dec!(100), dec!(0), dec!(0), PaymentStatus::Unpaid)]
    #[case(dec!(60), dec!(40), dec!(0), PaymentStatus::PartiallyPaid)]
    #[case(dec!(90), dec!(0), dec!(10), PaymentStatus::PartiallyPaid)]
    #[case(dec!(0), dec!(80), dec!(20), PaymentStatus::Paid)]
    fn payment_status_follows_balance(
        #[case] balance: Decimal,
        #[case] paid: Decimal,
        #[case] credited: Decimal,
        #[case] expected: PaymentStatus,
    ) {
        assert_eq!(derive_payment_status(balance, paid, credited), expected);
    }

    proptest! {
        #[test]
        fn total_is_sub_total_plus_tax(
            quantities in proptest::collection::vec(1i32..500, 1..6),
            rate_cents in 0i64..100_000,
            tax_bp in 0i64..=10_000,
        ) {
            let rate = Decimal::new(rate_cents, 2);
            let tax_rate = Decimal::new(tax_bp, 2);
            let items: Vec<_> = quantities.iter().map(|q| line(*q, rate)).collect();
            let totals = compute_totals(&items, tax_rate).expect("totals");

            prop_assert_eq!(totals.total_amount, totals.sub_total + totals.tax_amount);
            prop_assert!(totals.tax_amount >= Decimal::ZERO);
            prop_assert!(totals.tax_amount <= totals.sub_total);
            prop_assert_eq!(totals.total_amount.round_dp(2), totals.total_amount);
        }

        #[test]
        fn any_split_of_the_total_settles_the_invoice(
            total_cents in 1i64..10_000_000,
            paid_share in 0u32..=100,
        ) {
            let total = Decimal::new(total_cents, 2);
            let paid = (total * Decimal::from(paid_share) / Decimal::ONE_HUNDRED).round_dp(2);
            let credited = total - paid;
            let balance = total - paid - credited;

            prop_assert_eq!(balance, Decimal::ZERO);
            prop_assert_eq!(derive_payment_status(balance, paid, credited), PaymentStatus::Paid);
        }
    }
}
