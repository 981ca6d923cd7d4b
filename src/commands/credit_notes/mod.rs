mod cancel_credit_note_command;
mod issue_credit_note_command;

pub use cancel_credit_note_command::CancelCreditNoteCommand;
pub use issue_credit_note_command::{CreditNoteWithInvoice, IssueCreditNoteCommand};
