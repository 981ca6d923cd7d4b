pub mod clients;
pub mod common;
pub mod companies;
pub mod credit_notes;
pub mod grns;
pub mod inventory;
pub mod invoices;
pub mod machines;
pub mod processes;
pub mod purchase_orders;
pub mod skus;
pub mod users;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        clients::ClientService, companies::CompanyService, credit_notes::CreditNoteService,
        grns::GrnService, inventory::InventoryService, invoices::InvoiceService,
        machines::MachineService, payments::PaymentService, processes::ProcessService,
        purchase_orders::PurchaseOrderService, skus::SkuService, users::UserService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub companies: Arc<CompanyService>,
    pub clients: Arc<ClientService>,
    pub skus: Arc<SkuService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub grns: Arc<GrnService>,
    pub inventory: Arc<InventoryService>,
    pub invoices: Arc<InvoiceService>,
    pub payments: Arc<PaymentService>,
    pub credit_notes: Arc<CreditNoteService>,
    pub processes: Arc<ProcessService>,
    pub machines: Arc<MachineService>,
    pub users: Arc<UserService>,
}

impl AppServices {
    /// `number_width` is the zero padding used for document numbers.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, number_width: usize) -> Self {
        Self {
            companies: Arc::new(CompanyService::new(db_pool.clone(), event_sender.clone())),
            clients: Arc::new(ClientService::new(
                db_pool.clone(),
                event_sender.clone(),
                number_width,
            )),
            skus: Arc::new(SkuService::new(db_pool.clone(), number_width)),
            purchase_orders: Arc::new(PurchaseOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
                number_width,
            )),
            grns: Arc::new(GrnService::new(
                db_pool.clone(),
                event_sender.clone(),
                number_width,
            )),
            inventory: Arc::new(InventoryService::new(db_pool.clone(), event_sender.clone())),
            invoices: Arc::new(InvoiceService::new(
                db_pool.clone(),
                event_sender.clone(),
                number_width,
            )),
            payments: Arc::new(PaymentService::new(db_pool.clone(), event_sender.clone())),
            credit_notes: Arc::new(CreditNoteService::new(
                db_pool.clone(),
                event_sender.clone(),
                number_width,
            )),
            processes: Arc::new(ProcessService::new(db_pool.clone(), event_sender)),
            machines: Arc::new(MachineService::new(db_pool.clone())),
            users: Arc::new(UserService::new(db_pool)),
        }
    }
}
