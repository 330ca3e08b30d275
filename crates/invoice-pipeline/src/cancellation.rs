use invoice_core::TransactionStatus;
use invoice_db::{StoreError, TransitionOutcome};
use std::time::Duration;

use crate::context::PipelineDeps;
use crate::error::PipelineResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// Unknown or expired token.
    NotFound,
    /// The transaction had already started or finished.
    NotCancellable { status: TransactionStatus },
}

/// Aborts transactions that are still waiting for their upload
pub struct CancellationHandler {
    deps: PipelineDeps,
}

impl CancellationHandler {
    pub fn new(deps: PipelineDeps) -> Self {
        Self { deps }
    }

    /// Decide the cancellation of `token` and push the resulting status to
    /// `connection_id`. Does not close the connection; see [`Self::release`].
    #[tracing::instrument(skip(self))]
    pub async fn attempt(&self, token: &str, connection_id: &str) -> PipelineResult<CancelOutcome> {
        let transaction = match self.deps.transactions.get(token).await {
            Ok(transaction) => transaction,
            Err(StoreError::NotFound(_)) => return Ok(self.not_found(token, connection_id).await),
            Err(e) => return Err(e.into()),
        };

        if transaction.status != TransactionStatus::Generated {
            tracing::warn!(
                status = %transaction.status,
                "Cannot cancel an in-progress transaction"
            );
            return Ok(self.not_cancellable(token, connection_id, transaction.status).await);
        }

        let outcome = match self
            .deps
            .transactions
            .transition_status(token, TransactionStatus::Generated, TransactionStatus::Cancelled)
            .await
        {
            Ok(outcome) => outcome,
            Err(StoreError::NotFound(_)) => return Ok(self.not_found(token, connection_id).await),
            Err(e) => return Err(e.into()),
        };

        match outcome {
            TransitionOutcome::Applied => {
                tracing::info!("Transaction cancelled");
                self.deps
                    .notifier
                    .send_status(token, connection_id, TransactionStatus::Cancelled)
                    .await;
                Ok(CancelOutcome::Cancelled)
            }
            TransitionOutcome::Conflict { current } => {
                tracing::warn!(status = %current, "Transaction started before it could be cancelled");
                Ok(self.not_cancellable(token, connection_id, current).await)
            }
        }
    }

    /// Close the requesting connection, giving up after `bound`.
    pub async fn release(&self, connection_id: &str, bound: Duration) -> bool {
        match tokio::time::timeout(bound, self.deps.notifier.disconnect(connection_id)).await {
            Ok(closed) => closed,
            Err(_) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    bound_ms = bound.as_millis() as u64,
                    "Disconnect did not complete in time"
                );
                false
            }
        }
    }

    async fn not_found(&self, token: &str, connection_id: &str) -> CancelOutcome {
        tracing::info!("Cancellation for an unknown or expired transaction");
        self.deps
            .notifier
            .send_status(token, connection_id, TransactionStatus::NotFound)
            .await;
        CancelOutcome::NotFound
    }

    async fn not_cancellable(
        &self,
        token: &str,
        connection_id: &str,
        status: TransactionStatus,
    ) -> CancelOutcome {
        self.deps
            .notifier
            .send_status(token, connection_id, status)
            .await;
        CancelOutcome::NotCancellable { status }
    }
}
