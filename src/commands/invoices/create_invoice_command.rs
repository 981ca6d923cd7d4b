use crate::{
    commands::{
        guards,
        invoices::{compute_totals, InvoiceItemInput},
        Command,
    },
    db::DbPool,
    documents::{next_document_number, DocumentPrefix},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{credit_note, invoice_item, partial_payment, work_order_invoice, PaymentStatus, RecordStatus},
    validation::percentage,
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
pub struct CreateInvoiceCommand {
    pub company_id: Uuid,
    pub client_id: Uuid,
    /// Defaults to today.
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(custom = "percentage")]
    #[serde(default)]
    #[schema(value_type = String, example = "18")]
    pub tax_rate: Decimal,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<InvoiceItemInput>,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
    #[serde(skip, default = "crate::commands::default_number_width")]
    pub number_width: usize,
}

/// An invoice with everything hanging off it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub invoice: work_order_invoice::Model,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<invoice_item::Model>,
    #[schema(value_type = Vec<Object>)]
    pub payments: Vec<partial_payment::Model>,
    #[schema(value_type = Vec<Object>)]
    pub credit_notes: Vec<credit_note::Model>,
}

#[async_trait::async_trait]
impl Command for CreateInvoiceCommand {
    type Result = InvoiceWithItems;

    #[instrument(skip(self, db_pool, event_sender), fields(company_id = %self.company_id, client_id = %self.client_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.create_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("create_invoice", &e);
            e
        })?;
        metrics::INVOICES_CREATED.inc();

        info!(
            invoice_id = %result.invoice.id,
            invoice_number = %result.invoice.invoice_number,
            total = %result.invoice.total_amount,
            "invoice created"
        );
        event_sender
            .send_or_log(Event::InvoiceCreated {
                invoice_id: result.invoice.id,
                client_id: result.invoice.client_id,
                total_amount: result.invoice.total_amount,
                due_date: result.invoice.due_date,
            })
            .await;

        Ok(result)
    }
}

impl CreateInvoiceCommand {
    async fn create_in_db(&self, db: &DbPool) -> Result<InvoiceWithItems, ServiceError> {
        self.validate()?;
        for item in &self.items {
            item.validate()?;
        }
        let invoice_date = self.invoice_date.unwrap_or_else(|| Utc::now().date_naive());
        if matches!(self.due_date, Some(due) if due < invoice_date) {
            return Err(ServiceError::ValidationError(
                "due_date cannot be before invoice_date".to_string(),
            ));
        }

        let totals = compute_totals(&self.items, self.tax_rate)?;
        let amounts = self
            .items
            .iter()
            .map(InvoiceItemInput::amount)
            .collect::<Result<Vec<_>, _>>()?;

        let command = self.clone();
        db.transaction::<_, InvoiceWithItems, ServiceError>(|txn| {
            Box::pin(async move {
                guards::active_company(txn, command.company_id).await?;
                let client =
                    guards::company_client(txn, command.company_id, command.client_id).await?;
                for sku_id in command.items.iter().filter_map(|item| item.sku_id) {
                    guards::company_sku(txn, command.company_id, sku_id).await?;
                }

                let invoice_number = next_document_number(
                    txn,
                    command.company_id,
                    DocumentPrefix::Invoice,
                    command.number_width,
                )
                .await?;

                let now = Utc::now();
                let invoice = work_order_invoice::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    company_id: Set(command.company_id),
                    client_id: Set(client.id),
                    invoice_number: Set(invoice_number),
                    invoice_date: Set(invoice_date),
                    due_date: Set(command.due_date),
                    sub_total: Set(totals.sub_total),
                    tax_rate: Set(command.tax_rate),
                    tax_amount: Set(totals.tax_amount),
                    total_amount: Set(totals.total_amount),
                    paid_amount: Set(Decimal::ZERO),
                    credited_amount: Set(Decimal::ZERO),
                    balance_amount: Set(totals.total_amount),
                    payment_status: Set(if totals.total_amount > Decimal::ZERO {
                        PaymentStatus::Unpaid
                    } else {
                        PaymentStatus::Paid
                    }),
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

                let mut items = Vec::with_capacity(command.items.len());
                for (item, amount) in command.items.iter().zip(amounts) {
                    let saved = invoice_item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        invoice_id: Set(invoice.id),
                        sku_id: Set(item.sku_id),
                        description: Set(item.description.trim().to_string()),
                        quantity: Set(item.quantity),
                        rate: Set(item.rate),
                        amount: Set(amount),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                    items.push(saved);
                }

                Ok(InvoiceWithItems {
                    invoice,
                    items,
                    payments: Vec::new(),
                    credit_notes: Vec::new(),
                })
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
