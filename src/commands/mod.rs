use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern
///
/// A command owns every write that has to land atomically: it opens one
/// transaction, enforces the cross-table invariants inside it and emits its
/// domain events only after commit.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `db_pool` - Database connection pool for persistence operations
    /// * `event_sender` - Channel to publish domain events
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod credit_notes;
pub mod grns;
pub mod guards;
pub mod inventory;
pub mod invoices;
pub mod payments;
pub mod processes;
pub mod purchaseorders;

fn default_number_width() -> usize {
    5
}

fn amount_too_large() -> ServiceError {
    ServiceError::ValidationError("amount is too large".to_string())
}

/// `quantity * rate` rounded to 2 dp, rejecting values Decimal cannot hold.
pub(crate) fn line_amount(quantity: i32, rate: Decimal) -> Result<Decimal, ServiceError> {
    Decimal::from(quantity)
        .checked_mul(rate)
        .map(|amount| amount.round_dp(2))
        .ok_or_else(amount_too_large)
}

pub(crate) fn checked_total<I>(amounts: I) -> Result<Decimal, ServiceError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total.checked_add(amount).ok_or_else(amount_too_large)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn line_amounts_round_and_refuse_overflow() {
        assert_eq!(line_amount(3, dec!(10.333)).ok(), Some(dec!(31.00)));
        assert_matches!(
            line_amount(1000, Decimal::MAX),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            checked_total([Decimal::MAX, Decimal::ONE]),
            Err(ServiceError::ValidationError(_))
        );
        assert_eq!(checked_total([dec!(1.50), dec!(2)]).ok(), Some(dec!(3.50)));
    }
}
