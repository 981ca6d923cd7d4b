use crate::{
    commands::{
        invoices::refresh_invoice_balance,
        payments::PaymentWithInvoice,
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{partial_payment, work_order_invoice, RecordStatus},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Soft-deletes a payment and gives the amount back to the invoice balance.
#[derive(Debug, Clone)]
pub struct ReversePaymentCommand {
    pub payment_id: Uuid,
    pub reversed_by: Option<Uuid>,
}

#[async_trait::async_trait]
impl Command for ReversePaymentCommand {
    type Result = PaymentWithInvoice;

    #[instrument(skip(self, db_pool, event_sender), fields(payment_id = %self.payment_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.reverse_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("reverse_payment", &e);
            e
        })?;
        metrics::PAYMENTS_REVERSED.inc();

        info!(
            invoice_id = %result.invoice.id,
            balance_after = %result.invoice.balance_amount,
            "payment reversed"
        );
        event_sender
            .send_or_log(Event::PaymentReversed {
                payment_id: result.payment.id,
                invoice_id: result.invoice.id,
                amount: result.payment.amount,
            })
            .await;

        Ok(result)
    }
}

impl ReversePaymentCommand {
    async fn reverse_in_db(&self, db: &DbPool) -> Result<PaymentWithInvoice, ServiceError> {
        let payment_id = self.payment_id;
        let actor = self.reversed_by;

        db.transaction::<_, PaymentWithInvoice, ServiceError>(|txn| {
            Box::pin(async move {
                let payment = partial_payment::Entity::find_by_id(payment_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| ServiceError::not_found("Payment", payment_id))?;
                if payment.status != RecordStatus::Active {
                    return Err(ServiceError::InvalidOperation(format!(
                        "payment {} is already reversed",
                        payment_id
                    )));
                }

                let invoice = work_order_invoice::Entity::find_by_id(payment.invoice_id)
                    .lock_exclusive()
                    .one(txn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| ServiceError::not_found("Invoice", payment.invoice_id))?;

                let mut active: partial_payment::ActiveModel = payment.into();
                active.status = Set(RecordStatus::Inactive);
                active.updated_by = Set(actor);
                active.updated_at = Set(Utc::now());
                let payment = active.update(txn).await.map_err(ServiceError::db_error)?;

                let invoice = refresh_invoice_balance(txn, invoice, actor).await?;
                Ok(PaymentWithInvoice { payment, invoice })
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
