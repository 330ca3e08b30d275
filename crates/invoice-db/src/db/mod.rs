//! Database repositories for the data access layer
//!
//! `store` defines the traits the pipeline depends on. Postgres-backed
//! repositories live next to their in-memory counterparts in `memory`.
//
// Store traits and errors
pub mod store;
//
// Postgres repositories
pub mod invoice;
pub mod invoice_transaction;
//
// In-memory doubles
pub mod memory;

pub use invoice::InvoiceRepository;
pub use invoice_transaction::TransactionRepository;
pub use memory::{MemoryInvoiceStore, MemoryTransactionStore};
pub use store::{InvoiceStore, StoreError, StoreResult, TransactionStore, TransitionOutcome};
