use crate::{
    commands::{checked_total, guards, line_amount, Command},
    db::DbPool,
    documents::{next_document_number, DocumentPrefix},
    errors::ServiceError,
    events::{Event, EventSender},
    metrics,
    models::{purchase_order, purchase_order_item, PoStatus, RecordStatus},
    validation::non_negative_decimal,
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
pub struct CreatePurchaseOrderCommand {
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub supplier_name: String,
    /// Defaults to today.
    pub po_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<PurchaseOrderItemInput>,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
    #[serde(skip, default = "crate::commands::default_number_width")]
    pub number_width: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseOrderItemInput {
    pub sku_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(custom = "non_negative_decimal")]
    #[schema(value_type = String, example = "12.50")]
    pub rate: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseOrderWithItems {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub purchase_order: purchase_order::Model,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<purchase_order_item::Model>,
}

#[async_trait::async_trait]
impl Command for CreatePurchaseOrderCommand {
    type Result = PurchaseOrderWithItems;

    #[instrument(skip(self, db_pool, event_sender), fields(company_id = %self.company_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.create_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("create_purchase_order", &e);
            e
        })?;

        info!(
            purchase_order_id = %result.purchase_order.id,
            po_number = %result.purchase_order.po_number,
            total = %result.purchase_order.total_amount,
            "purchase order created"
        );
        event_sender
            .send_or_log(Event::PurchaseOrderCreated {
                purchase_order_id: result.purchase_order.id,
                company_id: result.purchase_order.company_id,
                total_amount: result.purchase_order.total_amount,
            })
            .await;

        Ok(result)
    }
}

impl CreatePurchaseOrderCommand {
    async fn create_in_db(&self, db: &DbPool) -> Result<PurchaseOrderWithItems, ServiceError> {
        self.validate()?;
        for item in &self.items {
            item.validate()?;
        }
        let po_date = self.po_date.unwrap_or_else(|| Utc::now().date_naive());
        if let Some(expected) = self.expected_delivery_date {
            if expected < po_date {
                return Err(ServiceError::ValidationError(
                    "expected_delivery_date cannot be before po_date".to_string(),
                ));
            }
        }

        let lines = self
            .items
            .iter()
            .map(|item| Ok((item.clone(), line_amount(item.quantity, item.rate)?)))
            .collect::<Result<Vec<(PurchaseOrderItemInput, Decimal)>, ServiceError>>()?;
        let total = checked_total(lines.iter().map(|(_, amount)| *amount))?;

        let command = self.clone();
        db.transaction::<_, PurchaseOrderWithItems, ServiceError>(|txn| {
            Box::pin(async move {
                guards::active_company(txn, command.company_id).await?;
                for item in &command.items {
                    guards::company_sku(txn, command.company_id, item.sku_id).await?;
                }

                let po_number = next_document_number(
                    txn,
                    command.company_id,
                    DocumentPrefix::PurchaseOrder,
                    command.number_width,
                )
                .await?;

                let now = Utc::now();
                let po_id = Uuid::new_v4();

                let purchase_order = purchase_order::ActiveModel {
                    id: Set(po_id),
                    company_id: Set(command.company_id),
                    po_number: Set(po_number),
                    supplier_name: Set(command.supplier_name.trim().to_string()),
                    po_date: Set(po_date),
                    expected_delivery_date: Set(command.expected_delivery_date),
                    po_status: Set(PoStatus::Open),
                    total_amount: Set(total),
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

                let mut items = Vec::with_capacity(lines.len());
                for (item, amount) in lines {
                    let saved = purchase_order_item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        purchase_order_id: Set(po_id),
                        sku_id: Set(item.sku_id),
                        quantity: Set(item.quantity),
                        rate: Set(item.rate),
                        amount: Set(amount),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                    items.push(saved);
                }

                Ok(PurchaseOrderWithItems {
                    purchase_order,
                    items,
                })
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
