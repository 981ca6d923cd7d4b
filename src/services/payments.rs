use crate::{
    commands::{
        payments::{PaymentWithInvoice, RecordPaymentCommand, ReversePaymentCommand},
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{partial_payment, work_order_invoice},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Partial payments against invoices.
#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PaymentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, command), fields(amount = %command.amount))]
    pub async fn record_payment(
        &self,
        invoice_id: Uuid,
        mut command: RecordPaymentCommand,
        actor: Option<Uuid>,
    ) -> Result<PaymentWithInvoice, ServiceError> {
        command.invoice_id = invoice_id;
        command.created_by = actor;
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn reverse_payment(
        &self,
        payment_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<PaymentWithInvoice, ServiceError> {
        ReversePaymentCommand {
            payment_id,
            reversed_by: actor,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    /// Every payment on the invoice, reversed ones included, oldest first.
    #[instrument(skip(self))]
    pub async fn list_for_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<partial_payment::Model>, ServiceError> {
        let exists = work_order_invoice::Entity::find_by_id(invoice_id)
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if exists == 0 {
            return Err(ServiceError::not_found("Invoice", invoice_id));
        }

        partial_payment::Entity::find()
            .filter(partial_payment::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(partial_payment::Column::PaymentDate)
            .order_by_asc(partial_payment::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}
