//! Invoice import transaction pipeline
//!
//! Three handlers coordinate only through the transaction record:
//! - [`UploadLinkIssuer`] mints a transaction and a presigned upload URL
//! - [`IngestionWorker`] validates and commits an uploaded file
//! - [`CancellationHandler`] aborts a transaction that has not started
//!
//! [`ImportPipeline`] bundles them and runs every invocation under the
//! configured wall-clock budget.

pub mod cancellation;
pub mod context;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod purge;
pub mod upload_link;

pub use cancellation::{CancelOutcome, CancellationHandler};
pub use context::{PipelineDeps, PipelineSettings};
pub use error::{PipelineError, PipelineResult};
pub use ingestion::{IngestionOutcome, IngestionWorker};
pub use pipeline::ImportPipeline;
pub use purge::{TransactionPurger, TransactionPurgerConfig};
pub use upload_link::{IssuedLink, UploadLinkIssuer};
