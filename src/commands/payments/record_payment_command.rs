use crate::{
    commands::{
        invoices::{check_within_balance, open_invoice, refresh_invoice_balance},
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{partial_payment, work_order_invoice, PaymentMethod, RecordStatus},
    validation::positive_decimal,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Records an installment against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentCommand {
    #[serde(skip)]
    pub invoice_id: Uuid,
    #[validate(custom = "positive_decimal")]
    #[schema(value_type = String, example = "2500.00")]
    pub amount: Decimal,
    /// Defaults to today.
    pub payment_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
    #[validate(length(max = 128))]
    pub reference_number: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentWithInvoice {
    #[schema(value_type = Object)]
    pub payment: partial_payment::Model,
    #[schema(value_type = Object)]
    pub invoice: work_order_invoice::Model,
}

#[async_trait::async_trait]
impl Command for RecordPaymentCommand {
    type Result = PaymentWithInvoice;

    #[instrument(skip(self, db_pool, event_sender), fields(invoice_id = %self.invoice_id, amount = %self.amount))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.record_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("record_payment", &e);
            e
        })?;
        metrics::PAYMENTS_RECORDED.inc();

        info!(
            payment_id = %result.payment.id,
            balance_after = %result.invoice.balance_amount,
            payment_status = %result.invoice.payment_status,
            "payment recorded"
        );
        event_sender
            .send_or_log(Event::PaymentRecorded {
                payment_id: result.payment.id,
                invoice_id: result.invoice.id,
                amount: result.payment.amount,
                balance_after: result.invoice.balance_amount,
            })
            .await;

        Ok(result)
    }
}

impl RecordPaymentCommand {
    async fn record_in_db(&self, db: &DbPool) -> Result<PaymentWithInvoice, ServiceError> {
        self.validate()?;
        let amount = self.amount.round_dp(2);
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount must be at least 0.01".to_string(),
            ));
        }

        let command = self.clone();
        db.transaction::<_, PaymentWithInvoice, ServiceError>(|txn| {
            Box::pin(async move {
                let invoice = open_invoice(txn, command.invoice_id).await?;
                check_within_balance(&invoice, amount)?;

                let now = Utc::now();
                let payment = partial_payment::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    invoice_id: Set(invoice.id),
                    amount: Set(amount),
                    payment_date: Set(command.payment_date.unwrap_or_else(|| now.date_naive())),
                    payment_method: Set(command.payment_method),
                    reference_number: Set(command.reference_number.clone()),
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

                let invoice = refresh_invoice_balance(txn, invoice, command.created_by).await?;
                Ok(PaymentWithInvoice { payment, invoice })
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
