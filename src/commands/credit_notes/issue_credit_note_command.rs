use crate::{
    commands::{
        invoices::{check_within_balance, open_invoice, refresh_invoice_balance},
        Command,
    },
    db::DbPool,
    documents::{next_document_number, DocumentPrefix},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{credit_note, work_order_invoice, RecordStatus},
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

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct IssueCreditNoteCommand {
    pub invoice_id: Uuid,
    #[validate(custom = "positive_decimal")]
    #[schema(value_type = String, example = "150.00")]
    pub amount: Decimal,
    /// Defaults to today.
    pub credit_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
    #[serde(skip, default = "crate::commands::default_number_width")]
    pub number_width: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreditNoteWithInvoice {
    #[schema(value_type = Object)]
    pub credit_note: credit_note::Model,
    #[schema(value_type = Object)]
    pub invoice: work_order_invoice::Model,
}

#[async_trait::async_trait]
impl Command for IssueCreditNoteCommand {
    type Result = CreditNoteWithInvoice;

    #[instrument(skip(self, db_pool, event_sender), fields(invoice_id = %self.invoice_id, amount = %self.amount))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.issue_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("issue_credit_note", &e);
            e
        })?;
        metrics::CREDIT_NOTES_ISSUED.inc();

        info!(
            credit_note_number = %result.credit_note.credit_note_number,
            balance_after = %result.invoice.balance_amount,
            "credit note issued"
        );
        event_sender
            .send_or_log(Event::CreditNoteIssued {
                credit_note_id: result.credit_note.id,
                invoice_id: result.invoice.id,
                amount: result.credit_note.amount,
            })
            .await;

        Ok(result)
    }
}

impl IssueCreditNoteCommand {
    async fn issue_in_db(&self, db: &DbPool) -> Result<CreditNoteWithInvoice, ServiceError> {
        self.validate()?;
        let amount = self.amount.round_dp(2);
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "amount must be at least 0.01".to_string(),
            ));
        }

        let command = self.clone();
        db.transaction::<_, CreditNoteWithInvoice, ServiceError>(|txn| {
            Box::pin(async move {
                let invoice = open_invoice(txn, command.invoice_id).await?;
                check_within_balance(&invoice, amount)?;

                let credit_note_number = next_document_number(
                    txn,
                    invoice.company_id,
                    DocumentPrefix::CreditNote,
                    command.number_width,
                )
                .await?;

                let now = Utc::now();
                let credit_note = credit_note::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    company_id: Set(invoice.company_id),
                    invoice_id: Set(invoice.id),
                    credit_note_number: Set(credit_note_number),
                    credit_date: Set(command.credit_date.unwrap_or_else(|| now.date_naive())),
                    amount: Set(amount),
                    reason: Set(command.reason.clone()),
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
                Ok(CreditNoteWithInvoice {
                    credit_note,
                    invoice,
                })
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
