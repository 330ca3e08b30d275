//! Invoice Import Core Library
//!
//! This crate provides the domain models, error types, configuration and
//! wire messages shared across the invoice import components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ImportServiceConfig, NotifierBackend, StoreBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    ClientAction, Invoice, InvoiceFile, InvoiceTransaction, ObjectCreatedEvent, ObjectRef,
    StatusMessage, TransactionStatus, UploadLinkMessage,
};
pub use storage_types::StorageBackend;
