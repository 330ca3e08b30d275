use invoice_core::AppError;
use invoice_db::StoreError;
use invoice_storage::StorageError;

/// Handler failures
///
/// Rejected files and lost races are outcomes, not errors; only a missing
/// transaction or a failed collaborator ends a handler with `Err`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Transaction store error: {0}")]
    Store(#[source] StoreError),

    #[error("Object storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{operation} exceeded its {budget_ms}ms budget")]
    Timeout {
        operation: &'static str,
        budget_ms: u64,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(token) => PipelineError::NotFound(token),
            other => PipelineError::Store(other),
        }
    }
}

impl PipelineError {
    /// A collaborator failed; the trigger is expected to redeliver.
    pub fn is_dependency_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::Store(_) | PipelineError::Storage(_) | PipelineError::Timeout { .. }
        )
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound(token) => {
                AppError::NotFound(format!("Transaction {} not found", token))
            }
            PipelineError::Store(e) => e.into(),
            PipelineError::Storage(e) => e.into(),
            PipelineError::Serialization(e) => AppError::Internal(e.to_string()),
            PipelineError::Timeout { .. } => AppError::Timeout(err.to_string()),
        }
    }
}
