use invoice_core::ObjectCreatedEvent;
use std::future::Future;
use std::sync::Arc;

use crate::cancellation::{CancelOutcome, CancellationHandler};
use crate::context::{PipelineDeps, PipelineSettings};
use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::{IngestionOutcome, IngestionWorker};
use crate::upload_link::{IssuedLink, UploadLinkIssuer};

/// The three import handlers behind one handle
///
/// Each call is bounded by the handler budget. When the budget elapses the
/// call fails with [`PipelineError::Timeout`]; any status already written
/// stays, and the next delivery resumes from it.
#[derive(Clone)]
pub struct ImportPipeline {
    issuer: Arc<UploadLinkIssuer>,
    worker: Arc<IngestionWorker>,
    cancellation: Arc<CancellationHandler>,
    settings: PipelineSettings,
}

impl ImportPipeline {
    pub fn new(deps: PipelineDeps, settings: PipelineSettings) -> Self {
        Self {
            issuer: Arc::new(UploadLinkIssuer::new(deps.clone(), settings.clone())),
            worker: Arc::new(IngestionWorker::new(deps.clone())),
            cancellation: Arc::new(CancellationHandler::new(deps)),
            settings,
        }
    }

    pub async fn issue_upload_link(
        &self,
        connection_id: &str,
        request_id: &str,
    ) -> PipelineResult<IssuedLink> {
        self.with_budget("upload_link", self.issuer.issue(connection_id, request_id))
            .await
    }

    /// Cancel `token` on behalf of `connection_id`.
    ///
    /// Only the decision runs under the handler budget. The requesting
    /// connection is closed afterwards on every path, failure and timeout
    /// included.
    pub async fn cancel_import(
        &self,
        token: &str,
        connection_id: &str,
    ) -> PipelineResult<CancelOutcome> {
        let result = self
            .with_budget("cancel_import", self.cancellation.attempt(token, connection_id))
            .await;

        if let Err(e) = &result {
            tracing::error!(error = %e, "Cancellation failed");
        }
        self.cancellation
            .release(connection_id, self.settings.notifier_timeout)
            .await;

        result
    }

    /// Ingest every object in the event.
    ///
    /// All records are attempted; if any failed, the first failure is
    /// returned so the trigger redelivers the event.
    pub async fn handle_object_created(
        &self,
        event: &ObjectCreatedEvent,
    ) -> PipelineResult<Vec<IngestionOutcome>> {
        self.with_budget("ingestion", async {
            self.worker
                .handle_event(event)
                .await
                .into_iter()
                .collect::<PipelineResult<Vec<_>>>()
        })
        .await
    }

    async fn with_budget<T, F>(&self, operation: &'static str, fut: F) -> PipelineResult<T>
    where
        F: Future<Output = PipelineResult<T>>,
    {
        let budget = self.settings.handler_timeout;
        match tokio::time::timeout(budget, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    operation,
                    budget_ms = budget.as_millis() as u64,
                    "Handler exceeded its time budget"
                );
                Err(PipelineError::Timeout {
                    operation,
                    budget_ms: budget.as_millis() as u64,
                })
            }
        }
    }
}
