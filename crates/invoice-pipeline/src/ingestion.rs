//! Object-created event handling
//!
//! The worker validates an uploaded file and either commits it as an
//! invoice or rejects it. Every status change goes through a
//! compare-and-set, so a concurrent cancellation or a duplicate delivery
//! can never move a transaction backwards or commit it twice.

use chrono::Utc;
use futures::future::join_all;
use invoice_core::{Invoice, InvoiceFile, InvoiceTransaction, ObjectCreatedEvent, TransactionStatus};
use invoice_db::TransitionOutcome;

use crate::context::PipelineDeps;
use crate::error::{PipelineError, PipelineResult};

/// What happened to one uploaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    /// Invoice committed, transaction `PROCESSED`.
    Processed {
        token: String,
        customer_name: String,
        invoice_number: String,
    },
    /// File rejected, transaction `NON_VALID_INVOICE_NUMBER`.
    Rejected { token: String },
    /// Another handler already moved the transaction on.
    Skipped {
        token: String,
        status: TransactionStatus,
    },
    /// No live transaction for the object key.
    UnknownTransaction { token: String },
}

pub struct IngestionWorker {
    deps: PipelineDeps,
}

impl IngestionWorker {
    pub fn new(deps: PipelineDeps) -> Self {
        Self { deps }
    }

    /// Process every record of an event concurrently.
    ///
    /// Records are independent; one failing does not stop the others.
    pub async fn handle_event(
        &self,
        event: &ObjectCreatedEvent,
    ) -> Vec<PipelineResult<IngestionOutcome>> {
        let objects = event.objects();
        let expected_bucket = self.deps.objects.bucket();

        for object in &objects {
            if object.bucket != expected_bucket {
                tracing::warn!(
                    bucket = %object.bucket,
                    expected = %expected_bucket,
                    key = %object.key,
                    "Object event from an unexpected bucket"
                );
            }
        }

        join_all(objects.iter().map(|object| self.ingest(&object.key))).await
    }

    /// Ingest the object stored under `token`.
    ///
    /// A transaction that is missing, or expires mid-flight, is not an
    /// error: there is nobody left to notify and nothing to retry.
    #[tracing::instrument(skip(self))]
    pub async fn ingest(&self, token: &str) -> PipelineResult<IngestionOutcome> {
        match self.run(token).await {
            Err(PipelineError::NotFound(_)) => {
                tracing::warn!("Object written for an unknown or expired transaction");
                Ok(IngestionOutcome::UnknownTransaction {
                    token: token.to_string(),
                })
            }
            other => other,
        }
    }

    async fn run(&self, token: &str) -> PipelineResult<IngestionOutcome> {
        let transaction = self.deps.transactions.get(token).await?;

        match transaction.status {
            TransactionStatus::Generated => {
                if let Some(outcome) = self.receive(&transaction).await? {
                    return Ok(outcome);
                }
            }
            // Redelivery after a failed attempt; the object is still there.
            TransactionStatus::Received => {
                tracing::debug!("Resuming ingestion of a received transaction");
            }
            status => {
                tracing::info!(status = %status, "Transaction already finished, skipping");
                self.deps
                    .notifier
                    .send_status(token, &transaction.connection_id, status)
                    .await;
                return Ok(IngestionOutcome::Skipped {
                    token: token.to_string(),
                    status,
                });
            }
        }

        let bytes = self.deps.objects.download(token).await?;

        match InvoiceFile::parse(&bytes) {
            Ok(file) if file.has_valid_invoice_number() => self.commit(&transaction, file).await,
            Ok(file) => {
                tracing::info!(
                    invoice_number = %file.invoice_number,
                    "Invoice number too short"
                );
                self.reject(&transaction).await
            }
            Err(e) => {
                tracing::info!(error = %e, "Uploaded file is not a valid invoice");
                self.reject(&transaction).await
            }
        }
    }

    /// GENERATED -> RECEIVED. Returns an outcome when ingestion must stop.
    async fn receive(
        &self,
        transaction: &InvoiceTransaction,
    ) -> PipelineResult<Option<IngestionOutcome>> {
        let token = transaction.token.as_str();
        let connection_id = transaction.connection_id.as_str();

        match self
            .deps
            .transactions
            .transition_status(token, TransactionStatus::Generated, TransactionStatus::Received)
            .await?
        {
            TransitionOutcome::Applied => {
                self.deps
                    .notifier
                    .send_status(token, connection_id, TransactionStatus::Received)
                    .await;
                Ok(None)
            }
            TransitionOutcome::Conflict { current } => {
                tracing::info!(current = %current, "Transaction moved on before it was received");
                self.deps
                    .notifier
                    .send_status(token, connection_id, current)
                    .await;
                Ok(Some(IngestionOutcome::Skipped {
                    token: token.to_string(),
                    status: current,
                }))
            }
        }
    }

    /// RECEIVED -> NON_VALID_INVOICE_NUMBER, with the push and disconnect
    /// running alongside the status update.
    async fn reject(&self, transaction: &InvoiceTransaction) -> PipelineResult<IngestionOutcome> {
        let token = transaction.token.as_str();
        let connection_id = transaction.connection_id.as_str();

        let notify = async {
            self.deps
                .notifier
                .send_status(token, connection_id, TransactionStatus::NonValidInvoiceNumber)
                .await;
            self.deps.notifier.disconnect(connection_id).await
        };
        let update = self.deps.transactions.transition_status(
            token,
            TransactionStatus::Received,
            TransactionStatus::NonValidInvoiceNumber,
        );

        let (transition, _) = tokio::join!(update, notify);

        match transition? {
            TransitionOutcome::Applied => Ok(IngestionOutcome::Rejected {
                token: token.to_string(),
            }),
            TransitionOutcome::Conflict { current } => {
                tracing::warn!(current = %current, "Rejection lost to a concurrent update");
                Ok(IngestionOutcome::Skipped {
                    token: token.to_string(),
                    status: current,
                })
            }
        }
    }

    /// Write the invoice, then delete the object, mark PROCESSED and notify
    /// at once. A failed write leaves the transaction in RECEIVED with its
    /// object, so redelivery retries the commit. Otherwise the first failure
    /// is returned after every branch settles.
    async fn commit(
        &self,
        transaction: &InvoiceTransaction,
        file: InvoiceFile,
    ) -> PipelineResult<IngestionOutcome> {
        let token = transaction.token.as_str();
        let connection_id = transaction.connection_id.as_str();
        let invoice = Invoice::from_file(file, token, Utc::now());

        if let Err(e) = self.deps.invoices.put(&invoice).await {
            tracing::error!(error = %e, "Failed to write invoice");
            return Err(e.into());
        }

        let (delete, transition, _) = tokio::join!(
            self.deps.objects.delete(token),
            self.deps.transactions.transition_status(
                token,
                TransactionStatus::Received,
                TransactionStatus::Processed,
            ),
            self.deps
                .notifier
                .send_status(token, connection_id, TransactionStatus::Processed),
        );

        if let Err(e) = &delete {
            tracing::error!(error = %e, "Failed to delete uploaded object");
        }
        if let Err(e) = &transition {
            tracing::error!(error = %e, "Failed to mark transaction processed");
        }

        delete?;
        match transition.map_err(PipelineError::from)? {
            TransitionOutcome::Applied => {
                tracing::info!(
                    customer = %invoice.customer_name,
                    invoice_number = %invoice.invoice_number,
                    "Invoice imported"
                );
                Ok(IngestionOutcome::Processed {
                    token: token.to_string(),
                    customer_name: invoice.customer_name,
                    invoice_number: invoice.invoice_number,
                })
            }
            TransitionOutcome::Conflict { current } => {
                tracing::info!(current = %current, "Transaction already committed by another delivery");
                Ok(IngestionOutcome::Skipped {
                    token: token.to_string(),
                    status: current,
                })
            }
        }
    }
}
