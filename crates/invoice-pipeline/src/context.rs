//! Dependencies and settings shared by the pipeline handlers.

use invoice_core::constants::{
    HANDLER_TIMEOUT_SECS, NOTIFIER_TIMEOUT_SECS, TRANSACTION_TTL_SECS, UPLOAD_URL_EXPIRES_SECS,
};
use invoice_core::Config;
use invoice_db::{InvoiceStore, TransactionStore};
use invoice_infra::ConnectionNotifier;
use invoice_storage::ObjectAccess;
use std::sync::Arc;
use std::time::Duration;

/// Explicitly constructed collaborators, injected into every handler.
#[derive(Clone)]
pub struct PipelineDeps {
    pub transactions: Arc<dyn TransactionStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub objects: Arc<dyn ObjectAccess>,
    pub notifier: Arc<dyn ConnectionNotifier>,
}

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub upload_url_expires: Duration,
    pub transaction_ttl_secs: i64,
    pub handler_timeout: Duration,
    /// Bound on the disconnect that closes every cancellation.
    pub notifier_timeout: Duration,
    /// Recorded on issued transactions.
    pub notifier_endpoint: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            upload_url_expires: Duration::from_secs(UPLOAD_URL_EXPIRES_SECS),
            transaction_ttl_secs: TRANSACTION_TTL_SECS,
            handler_timeout: Duration::from_secs(HANDLER_TIMEOUT_SECS),
            notifier_timeout: Duration::from_secs(NOTIFIER_TIMEOUT_SECS),
            notifier_endpoint: None,
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            upload_url_expires: Duration::from_secs(config.upload_url_expires_secs()),
            transaction_ttl_secs: config.transaction_ttl_secs(),
            handler_timeout: Duration::from_secs(config.handler_timeout_secs()),
            notifier_timeout: Duration::from_secs(config.notifier_timeout_secs()),
            notifier_endpoint: config.notifier_endpoint().map(String::from),
        }
    }
}
