//! Application state shared by every handler.

use invoice_core::Config;
use invoice_infra::ConnectionRegistry;
use invoice_pipeline::{ImportPipeline, TransactionPurger};
use invoice_storage::ObjectAccess;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: ImportPipeline,
    pub objects: Arc<dyn ObjectAccess>,
    /// Present when connections are held in-process (`NOTIFIER_BACKEND=local`).
    pub registry: Option<ConnectionRegistry>,
    /// Present when `STORE_BACKEND=postgres`.
    pub pool: Option<PgPool>,
    pub purger: Option<TransactionPurger>,
}
