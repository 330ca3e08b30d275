//! Connection notifier selection

use anyhow::{Context, Result};
use invoice_core::{Config, NotifierBackend};
use invoice_infra::{ConnectionNotifier, ConnectionRegistry, HttpConnectionNotifier};
use std::sync::Arc;
use std::time::Duration;

pub struct NotifierSetup {
    pub notifier: Arc<dyn ConnectionNotifier>,
    /// Set for the in-process backend, which also serves `/ws`.
    pub registry: Option<ConnectionRegistry>,
}

impl NotifierSetup {
    pub fn local(registry: ConnectionRegistry) -> Self {
        Self {
            notifier: Arc::new(registry.clone()),
            registry: Some(registry),
        }
    }
}

pub fn setup_notifier(config: &Config) -> Result<NotifierSetup> {
    match config.notifier_backend() {
        NotifierBackend::Http => {
            let endpoint = config
                .notifier_endpoint()
                .context("INVOICE_WSAPI_ENDPOINT is required for the http notifier")?;
            let notifier = HttpConnectionNotifier::new(
                endpoint,
                Duration::from_secs(config.notifier_timeout_secs()),
            )
            .context("Failed to build connection gateway client")?;

            tracing::info!(endpoint = %endpoint, "Using connection gateway notifier");
            Ok(NotifierSetup {
                notifier: Arc::new(notifier),
                registry: None,
            })
        }
        NotifierBackend::Local => {
            tracing::info!("Using in-process connection registry");
            Ok(NotifierSetup::local(ConnectionRegistry::new()))
        }
    }
}
