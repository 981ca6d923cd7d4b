use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event after a committed write. The write already happened, so
    /// a closed channel is logged instead of failing the request.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            error!(event = name, error = %e, "dropping domain event");
        }
    }
}

/// Domain events emitted after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    CompanyCreated(Uuid),
    ClientCreated {
        client_id: Uuid,
        company_id: Uuid,
    },
    PurchaseOrderCreated {
        purchase_order_id: Uuid,
        company_id: Uuid,
        total_amount: Decimal,
    },
    PurchaseOrderStatusChanged {
        purchase_order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    GrnPosted {
        grn_id: Uuid,
        purchase_order_id: Uuid,
        accepted_quantity: i64,
    },
    GrnCancelled {
        grn_id: Uuid,
        purchase_order_id: Uuid,
    },
    InventoryAdjusted {
        inventory_id: Uuid,
        sku_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
        reason: String,
    },
    LowStock {
        inventory_id: Uuid,
        sku_id: Uuid,
        quantity_on_hand: i32,
        reorder_level: i32,
    },
    InvoiceCreated {
        invoice_id: Uuid,
        client_id: Uuid,
        total_amount: Decimal,
        due_date: Option<NaiveDate>,
    },
    PaymentRecorded {
        payment_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
        balance_after: Decimal,
    },
    PaymentReversed {
        payment_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
    },
    CreditNoteIssued {
        credit_note_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
    },
    CreditNoteCancelled {
        credit_note_id: Uuid,
        invoice_id: Uuid,
    },
    ProcessFieldChanged {
        process_id: Uuid,
        field_key: String,
        change: FieldChange,
        machines_touched: usize,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FieldChange {
    Added,
    Updated,
    Removed,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CompanyCreated(_) => "company_created",
            Event::ClientCreated { .. } => "client_created",
            Event::PurchaseOrderCreated { .. } => "purchase_order_created",
            Event::PurchaseOrderStatusChanged { .. } => "purchase_order_status_changed",
            Event::GrnPosted { .. } => "grn_posted",
            Event::GrnCancelled { .. } => "grn_cancelled",
            Event::InventoryAdjusted { .. } => "inventory_adjusted",
            Event::LowStock { .. } => "low_stock",
            Event::InvoiceCreated { .. } => "invoice_created",
            Event::PaymentRecorded { .. } => "payment_recorded",
            Event::PaymentReversed { .. } => "payment_reversed",
            Event::CreditNoteIssued { .. } => "credit_note_issued",
            Event::CreditNoteCancelled { .. } => "credit_note_cancelled",
            Event::ProcessFieldChanged { .. } => "process_field_changed",
        }
    }
}

/// Drains the event channel and logs each event with structured fields.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::LowStock {
                inventory_id,
                sku_id,
                quantity_on_hand,
                reorder_level,
            } => {
                warn!(
                    %inventory_id,
                    %sku_id,
                    quantity_on_hand,
                    reorder_level,
                    "stock at or below reorder level"
                );
            }
            Event::PurchaseOrderStatusChanged {
                purchase_order_id,
                old_status,
                new_status,
            } => {
                info!(%purchase_order_id, %old_status, %new_status, "purchase order status changed");
            }
            Event::PaymentRecorded {
                payment_id,
                invoice_id,
                amount,
                balance_after,
            } => {
                info!(%payment_id, %invoice_id, %amount, %balance_after, "payment recorded");
            }
            Event::ProcessFieldChanged {
                process_id,
                field_key,
                change,
                machines_touched,
            } => {
                info!(%process_id, %field_key, %change, machines_touched, "process field changed");
            }
            other => {
                info!(event = other.name(), payload = ?other, "domain event");
            }
        }
    }

    info!("Event channel closed, stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::CompanyCreated(id)).await.unwrap();

        assert_eq!(rx.recv().await, Some(Event::CompanyCreated(id)));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::CompanyCreated(Uuid::new_v4())).await.is_err());
        sender
            .send_or_log(Event::CompanyCreated(Uuid::new_v4()))
            .await;
    }
}
