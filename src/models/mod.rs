//! Database entities.
//!
//! Every business table carries a [`RecordStatus`] soft-delete flag plus
//! `created_by`, `updated_by`, `created_at` and `updated_at` audit columns.

pub mod common;

// Master data
pub mod client;
pub mod company;
pub mod sku;
pub mod user;

// Procurement and stock
pub mod grn;
pub mod grn_item;
pub mod inventory;
pub mod inventory_transaction;
pub mod purchase_order;
pub mod purchase_order_item;

// Billing
pub mod credit_note;
pub mod invoice_item;
pub mod partial_payment;
pub mod work_order_invoice;

// Shop floor
pub mod machine;
pub mod machine_process;
pub mod process_field;
pub mod process_name;

pub mod id_sequence;

pub use common::RecordStatus;
pub use inventory_transaction::ReferenceType;
pub use partial_payment::PaymentMethod;
pub use process_field::FieldType;
pub use purchase_order::PoStatus;
pub use user::UserRole;
pub use work_order_invoice::PaymentStatus;
