use crate::{
    commands::{
        invoices::{CancelInvoiceCommand, CreateInvoiceCommand, InvoiceWithItems},
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{
        client, credit_note, invoice_item, partial_payment, work_order_invoice, PaymentStatus,
        RecordStatus,
    },
    services::{fetch_page, Page},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct InvoiceFilter {
    pub company_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<RecordStatus>,
    /// Only invoices past their due date with a balance left
    #[serde(default)]
    pub overdue_only: bool,
}

/// What a client has been billed and what is still owed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClientStatement {
    pub client_id: Uuid,
    pub client_name: String,
    pub currency: String,
    pub invoice_count: usize,
    #[schema(value_type = String)]
    pub total_invoiced: Decimal,
    #[schema(value_type = String)]
    pub total_paid: Decimal,
    #[schema(value_type = String)]
    pub total_credited: Decimal,
    #[schema(value_type = String)]
    pub outstanding: Decimal,
    #[schema(value_type = String)]
    pub overdue: Decimal,
    pub as_of: NaiveDate,
}

impl ClientStatement {
    pub fn from_invoices(
        client: &client::Model,
        invoices: &[work_order_invoice::Model],
        as_of: NaiveDate,
        currency: &str,
    ) -> Self {
        let sum = |f: fn(&work_order_invoice::Model) -> Decimal| -> Decimal {
            invoices.iter().map(f).sum()
        };
        Self {
            client_id: client.id,
            client_name: client.name.clone(),
            currency: currency.to_string(),
            invoice_count: invoices.len(),
            total_invoiced: sum(|i| i.total_amount),
            total_paid: sum(|i| i.paid_amount),
            total_credited: sum(|i| i.credited_amount),
            outstanding: sum(|i| i.balance_amount),
            overdue: invoices
                .iter()
                .filter(|i| i.is_overdue(as_of))
                .map(|i| i.balance_amount)
                .sum(),
            as_of,
        }
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    number_width: usize,
}

impl InvoiceService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, number_width: usize) -> Self {
        Self {
            db_pool,
            event_sender,
            number_width,
        }
    }

    #[instrument(skip(self, command), fields(client_id = %command.client_id))]
    pub async fn create_invoice(
        &self,
        mut command: CreateInvoiceCommand,
        actor: Option<Uuid>,
    ) -> Result<InvoiceWithItems, ServiceError> {
        command.created_by = actor;
        command.number_width = self.number_width;
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, id: Uuid) -> Result<InvoiceWithItems, ServiceError> {
        let db = &*self.db_pool;
        let invoice = work_order_invoice::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Invoice", id))?;
        let items = invoice_item::Entity::find()
            .filter(invoice_item::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_item::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let payments = partial_payment::Entity::find()
            .filter(partial_payment::Column::InvoiceId.eq(id))
            .order_by_asc(partial_payment::Column::PaymentDate)
            .order_by_asc(partial_payment::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let credit_notes = credit_note::Entity::find()
            .filter(credit_note::Column::InvoiceId.eq(id))
            .order_by_asc(credit_note::Column::CreditDate)
            .order_by_asc(credit_note::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(InvoiceWithItems {
            invoice,
            items,
            payments,
            credit_notes,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<work_order_invoice::Model>, ServiceError> {
        let mut query = work_order_invoice::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(work_order_invoice::Column::CompanyId.eq(company_id));
        }
        if let Some(client_id) = filter.client_id {
            query = query.filter(work_order_invoice::Column::ClientId.eq(client_id));
        }
        if let Some(payment_status) = filter.payment_status {
            query = query.filter(work_order_invoice::Column::PaymentStatus.eq(payment_status));
        }
        if let Some(status) = filter.status {
            query = query.filter(work_order_invoice::Column::Status.eq(status));
        }
        if filter.overdue_only {
            let today = Utc::now().date_naive();
            query = query
                .filter(work_order_invoice::Column::DueDate.lt(today))
                .filter(work_order_invoice::Column::PaymentStatus.ne(PaymentStatus::Paid))
                .filter(work_order_invoice::Column::Status.eq(RecordStatus::Active));
        }
        let query = query
            .order_by_desc(work_order_invoice::Column::InvoiceDate)
            .order_by_desc(work_order_invoice::Column::InvoiceNumber);
        fetch_page(&self.db_pool, query, page, limit).await
    }

    /// Soft delete; refused while the invoice has active payments.
    #[instrument(skip(self))]
    pub async fn cancel_invoice(
        &self,
        invoice_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<work_order_invoice::Model, ServiceError> {
        CancelInvoiceCommand {
            invoice_id,
            cancelled_by: actor,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    /// Totals over the client's active invoices.
    #[instrument(skip(self))]
    pub async fn client_statement(
        &self,
        client_id: Uuid,
        currency: &str,
    ) -> Result<ClientStatement, ServiceError> {
        let db = &*self.db_pool;
        let client = client::Entity::find_by_id(client_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Client", client_id))?;
        let invoices = work_order_invoice::Entity::find()
            .filter(work_order_invoice::Column::ClientId.eq(client_id))
            .filter(work_order_invoice::Column::Status.eq(RecordStatus::Active))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(ClientStatement::from_invoices(
            &client,
            &invoices,
            Utc::now().date_naive(),
            currency,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(total: Decimal, paid: Decimal, credited: Decimal, due: Option<NaiveDate>) -> work_order_invoice::Model {
        let now = Utc::now();
        work_order_invoice::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            client_id: Uuid::nil(),
            invoice_number: "INV-00001".into(),
            invoice_date: now.date_naive(),
            due_date: due,
            sub_total: total,
            tax_rate: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: total,
            paid_amount: paid,
            credited_amount: credited,
            balance_amount: total - paid - credited,
            payment_status: PaymentStatus::Unpaid,
            notes: None,
            status: RecordStatus::Active,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn statement_sums_outstanding_and_overdue() {
        let now = Utc::now();
        let client = client::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            client_code: "CLI-00001".into(),
            name: "Sunrise Foods".into(),
            contact_person: None,
            email: None,
            phone: None,
            gst_number: None,
            billing_address: None,
            shipping_address: None,
            credit_limit: None,
            status: RecordStatus::Active,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let past = NaiveDate::from_ymd_opt(2025, 3, 1);
        let future = NaiveDate::from_ymd_opt(2025, 4, 30);
        let invoices = vec![
            invoice(dec!(1000), dec!(400), dec!(100), past),
            invoice(dec!(500), dec!(0), dec!(0), future),
            invoice(dec!(200), dec!(200), dec!(0), past),
        ];

        let statement = ClientStatement::from_invoices(&client, &invoices, as_of, "INR");
        assert_eq!(statement.invoice_count, 3);
        assert_eq!(statement.total_invoiced, dec!(1700));
        assert_eq!(statement.total_paid, dec!(600));
        assert_eq!(statement.total_credited, dec!(100));
        assert_eq!(statement.outstanding, dec!(1000));
        assert_eq!(statement.overdue, dec!(500));
    }
}
