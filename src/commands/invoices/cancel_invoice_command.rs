use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    metrics,
    models::{partial_payment, work_order_invoice, RecordStatus},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Soft-deletes an invoice that has no active payments.
#[derive(Debug, Clone)]
pub struct CancelInvoiceCommand {
    pub invoice_id: Uuid,
    pub cancelled_by: Option<Uuid>,
}

#[async_trait::async_trait]
impl Command for CancelInvoiceCommand {
    type Result = work_order_invoice::Model;

    #[instrument(skip(self, db_pool, _event_sender), fields(invoice_id = %self.invoice_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        _event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let invoice_id = self.invoice_id;
        let actor = self.cancelled_by;

        let invoice = db_pool
            .transaction::<_, work_order_invoice::Model, ServiceError>(|txn| {
                Box::pin(async move {
                    let invoice = work_order_invoice::Entity::find_by_id(invoice_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::not_found("Invoice", invoice_id))?;
                    if invoice.status != RecordStatus::Active {
                        return Err(ServiceError::InvalidOperation(format!(
                            "invoice {} is already cancelled",
                            invoice.invoice_number
                        )));
                    }

                    let active_payments = partial_payment::Entity::find()
                        .filter(partial_payment::Column::InvoiceId.eq(invoice_id))
                        .filter(partial_payment::Column::Status.eq(RecordStatus::Active))
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if active_payments > 0 {
                        return Err(ServiceError::InvalidOperation(format!(
                            "invoice {} has {} active payment(s); reverse them first",
                            invoice.invoice_number, active_payments
                        )));
                    }

                    let mut active: work_order_invoice::ActiveModel = invoice.into();
                    active.status = Set(RecordStatus::Inactive);
                    active.updated_by = Set(actor);
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(|e| {
                let e = ServiceError::from(e);
                metrics::record_failure("cancel_invoice", &e);
                e
            })?;

        info!(invoice_number = %invoice.invoice_number, "invoice cancelled");
        Ok(invoice)
    }
}
