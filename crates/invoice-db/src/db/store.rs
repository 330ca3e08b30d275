//! Store traits shared by every persistence backend.

use async_trait::async_trait;
use invoice_core::{AppError, Invoice, InvoiceTransaction, TransactionStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Status {0} cannot be persisted")]
    InvalidStatus(TransactionStatus),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::AlreadyExists(msg) => AppError::Conflict(msg),
            StoreError::InvalidStatus(status) => {
                AppError::InvalidInput(format!("Status {} cannot be persisted", status))
            }
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Result of a conditional status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The record held the expected status and now holds the new one.
    Applied,
    /// The record held a different status; nothing was written.
    Conflict { current: TransactionStatus },
}

/// Durable record of in-flight upload transactions.
///
/// Records whose `ttl` has passed are invisible to every read and write,
/// whether or not `purge_expired` has reclaimed them yet.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert a new transaction. Fails with `AlreadyExists` on token collision.
    async fn create(&self, transaction: &InvoiceTransaction) -> StoreResult<()>;

    /// Fetch a live transaction. Fails with `NotFound` if absent or expired.
    async fn get(&self, token: &str) -> StoreResult<InvoiceTransaction>;

    /// Unconditional status overwrite.
    async fn update_status(&self, token: &str, status: TransactionStatus) -> StoreResult<()>;

    /// Overwrite the status only if it currently equals `expected`.
    async fn transition_status(
        &self,
        token: &str,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> StoreResult<TransitionOutcome>;

    /// Physically remove expired records; returns how many were removed.
    async fn purge_expired(&self) -> StoreResult<u64>;
}

/// Durable record of committed invoices.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Keyed upsert on `(customer_name, invoice_number)`.
    async fn put(&self, invoice: &Invoice) -> StoreResult<()>;

    async fn get(&self, customer_name: &str, invoice_number: &str)
        -> StoreResult<Option<Invoice>>;

    async fn list_for_customer(&self, customer_name: &str) -> StoreResult<Vec<Invoice>>;
}

pub(crate) fn ensure_persistable(status: TransactionStatus) -> StoreResult<()> {
    if status.is_persistable() {
        Ok(())
    } else {
        Err(StoreError::InvalidStatus(status))
    }
}
