mod record_payment_command;
mod reverse_payment_command;

pub use record_payment_command::{PaymentWithInvoice, RecordPaymentCommand};
pub use reverse_payment_command::ReversePaymentCommand;
