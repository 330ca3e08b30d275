use anyhow::{Context, Result};
use invoice_core::Config;
use invoice_storage::{create_storage, ObjectAccess};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn ObjectAccess>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize object storage")?;

    tracing::info!(
        backend = %storage.backend_type(),
        bucket = %storage.bucket(),
        "Object storage initialized"
    );

    Ok(storage)
}
