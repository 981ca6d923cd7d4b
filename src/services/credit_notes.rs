use crate::{
    commands::{
        credit_notes::{CancelCreditNoteCommand, CreditNoteWithInvoice, IssueCreditNoteCommand},
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    models::{credit_note, RecordStatus},
    services::{fetch_page, Page},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CreditNoteFilter {
    pub company_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub status: Option<RecordStatus>,
}

#[derive(Clone)]
pub struct CreditNoteService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    number_width: usize,
}

impl CreditNoteService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, number_width: usize) -> Self {
        Self {
            db_pool,
            event_sender,
            number_width,
        }
    }

    #[instrument(skip(self, command), fields(invoice_id = %command.invoice_id))]
    pub async fn issue_credit_note(
        &self,
        mut command: IssueCreditNoteCommand,
        actor: Option<Uuid>,
    ) -> Result<CreditNoteWithInvoice, ServiceError> {
        command.created_by = actor;
        command.number_width = self.number_width;
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_credit_note(
        &self,
        credit_note_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<CreditNoteWithInvoice, ServiceError> {
        CancelCreditNoteCommand {
            credit_note_id,
            cancelled_by: actor,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_credit_note(&self, id: Uuid) -> Result<credit_note::Model, ServiceError> {
        credit_note::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("Credit note", id))
    }

    #[instrument(skip(self))]
    pub async fn list_credit_notes(
        &self,
        filter: CreditNoteFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<credit_note::Model>, ServiceError> {
        let mut query = credit_note::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(credit_note::Column::CompanyId.eq(company_id));
        }
        if let Some(invoice_id) = filter.invoice_id {
            query = query.filter(credit_note::Column::InvoiceId.eq(invoice_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(credit_note::Column::Status.eq(status));
        }
        let query = query
            .order_by_desc(credit_note::Column::CreditDate)
            .order_by_desc(credit_note::Column::CreditNoteNumber);
        fetch_page(&self.db_pool, query, page, limit).await
    }
}
