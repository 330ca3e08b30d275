//! Persistence for import transactions and committed invoices.

pub mod db;

pub use db::{
    InvoiceRepository, InvoiceStore, MemoryInvoiceStore, MemoryTransactionStore, StoreError,
    StoreResult, TransactionRepository, TransactionStore, TransitionOutcome,
};
