//! Application setup and initialization

pub mod database;
pub mod notifier;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::constants::SERVICE_NAME;
use crate::state::AppState;
use anyhow::{Context, Result};
use invoice_core::{Config, StoreBackend};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    invoice_infra::init_telemetry(SERVICE_NAME, config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        store_backend = %config.store_backend(),
        storage_backend = %config.storage_backend(),
        notifier_backend = %config.notifier_backend(),
        "Configuration loaded and validated successfully"
    );

    let pool = match config.store_backend() {
        StoreBackend::Postgres => Some(database::setup_database(&config).await?),
        StoreBackend::Memory => None,
    };

    let objects = storage::setup_storage(&config).await?;
    let notifier = notifier::setup_notifier(&config)?;

    let state = services::initialize_services(&config, pool, objects, notifier)?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
