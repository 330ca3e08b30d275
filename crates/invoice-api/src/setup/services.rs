//! Store, pipeline and background service wiring

use super::notifier::NotifierSetup;
use crate::state::AppState;
use anyhow::{Context, Result};
use invoice_core::{Config, StoreBackend};
use invoice_db::{
    InvoiceRepository, InvoiceStore, MemoryInvoiceStore, MemoryTransactionStore,
    TransactionRepository, TransactionStore,
};
use invoice_pipeline::{
    ImportPipeline, PipelineDeps, PipelineSettings, TransactionPurger, TransactionPurgerConfig,
};
use invoice_storage::ObjectAccess;
use sqlx::PgPool;
use std::sync::Arc;

pub fn initialize_services(
    config: &Config,
    pool: Option<PgPool>,
    objects: Arc<dyn ObjectAccess>,
    notifier: NotifierSetup,
) -> Result<Arc<AppState>> {
    let (transactions, invoices): (Arc<dyn TransactionStore>, Arc<dyn InvoiceStore>) =
        match config.store_backend() {
            StoreBackend::Postgres => {
                let pool = pool
                    .clone()
                    .context("Postgres store selected without a database pool")?;
                (
                    Arc::new(TransactionRepository::new(pool.clone())),
                    Arc::new(InvoiceRepository::new(pool)),
                )
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; data is lost on restart");
                (
                    Arc::new(MemoryTransactionStore::new()),
                    Arc::new(MemoryInvoiceStore::new()),
                )
            }
        };

    let purger = TransactionPurger::start(
        transactions.clone(),
        TransactionPurgerConfig {
            poll_interval_seconds: config.transaction_purge_interval_secs(),
        },
    );

    let deps = PipelineDeps {
        transactions,
        invoices,
        objects: objects.clone(),
        notifier: notifier.notifier,
    };
    let settings = PipelineSettings::from(config);
    tracing::info!(
        handler_timeout_secs = settings.handler_timeout.as_secs(),
        upload_url_expires_secs = settings.upload_url_expires.as_secs(),
        transaction_ttl_secs = settings.transaction_ttl_secs,
        "Import pipeline initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        pipeline: ImportPipeline::new(deps, settings),
        objects,
        registry: notifier.registry,
        pool,
        purger,
    }))
}
