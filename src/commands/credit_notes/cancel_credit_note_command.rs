use crate::{
    commands::{credit_notes::CreditNoteWithInvoice, invoices::refresh_invoice_balance, Command},
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{credit_note, work_order_invoice, RecordStatus},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Voids a credit note; the invoice owes the amount again.
#[derive(Debug, Clone)]
pub struct CancelCreditNoteCommand {
    pub credit_note_id: Uuid,
    pub cancelled_by: Option<Uuid>,
}

#[async_trait::async_trait]
impl Command for CancelCreditNoteCommand {
    type Result = CreditNoteWithInvoice;

    #[instrument(skip(self, db_pool, event_sender), fields(credit_note_id = %self.credit_note_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let credit_note_id = self.credit_note_id;
        let actor = self.cancelled_by;

        let result = db_pool
            .transaction::<_, CreditNoteWithInvoice, ServiceError>(|txn| {
                Box::pin(async move {
                    let note = credit_note::Entity::find_by_id(credit_note_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::not_found("Credit note", credit_note_id))?;
                    if note.status != RecordStatus::Active {
                        return Err(ServiceError::InvalidOperation(format!(
                            "credit note {} is already cancelled",
                            note.credit_note_number
                        )));
                    }
                    let invoice = work_order_invoice::Entity::find_by_id(note.invoice_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::not_found("Invoice", note.invoice_id))?;

                    let mut active: credit_note::ActiveModel = note.into();
                    active.status = Set(RecordStatus::Inactive);
                    active.updated_by = Set(actor);
                    active.updated_at = Set(Utc::now());
                    let credit_note = active.update(txn).await.map_err(ServiceError::db_error)?;

                    let invoice = refresh_invoice_balance(txn, invoice, actor).await?;
                    Ok(CreditNoteWithInvoice {
                        credit_note,
                        invoice,
                    })
                })
            })
            .await
            .map_err(|e| {
                let e = ServiceError::from(e);
                metrics::record_failure("cancel_credit_note", &e);
                e
            })?;

        info!(
            credit_note_number = %result.credit_note.credit_note_number,
            balance_after = %result.invoice.balance_amount,
            "credit note cancelled"
        );
        event_sender
            .send_or_log(Event::CreditNoteCancelled {
                credit_note_id: result.credit_note.id,
                invoice_id: result.invoice.id,
            })
            .await;

        Ok(result)
    }
}
