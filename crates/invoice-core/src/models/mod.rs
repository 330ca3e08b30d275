pub mod events;
pub mod invoice;
pub mod messages;
pub mod transaction;

pub use events::{ObjectCreatedEvent, ObjectRef};
pub use invoice::{Invoice, InvoiceFile};
pub use messages::{ClientAction, StatusMessage, UploadLinkMessage};
pub use transaction::{InvoiceTransaction, TransactionStatus};
