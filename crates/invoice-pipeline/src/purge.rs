use anyhow::{Context, Result};
use invoice_core::constants::TRANSACTION_PURGE_INTERVAL_SECS;
use invoice_db::TransactionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Configuration for the expired-transaction purger
#[derive(Clone)]
pub struct TransactionPurgerConfig {
    pub poll_interval_seconds: u64,
}

impl Default for TransactionPurgerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: TRANSACTION_PURGE_INTERVAL_SECS,
        }
    }
}

/// Background service that deletes expired transaction records
///
/// Expired records are already invisible to every read; purging only
/// reclaims space.
#[derive(Clone)]
pub struct TransactionPurger {
    shutdown_tx: mpsc::Sender<()>,
}

impl TransactionPurger {
    /// Spawn the purge loop. Returns `None` when the interval is zero.
    pub fn start(store: Arc<dyn TransactionStore>, config: TransactionPurgerConfig) -> Option<Self> {
        if config.poll_interval_seconds == 0 {
            tracing::info!("Transaction purger disabled");
            return None;
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            Self::worker_loop(store, config, shutdown_rx).await;
        });

        Some(Self { shutdown_tx })
    }

    async fn worker_loop(
        store: Arc<dyn TransactionStore>,
        config: TransactionPurgerConfig,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut poll_interval = interval(Duration::from_secs(config.poll_interval_seconds));

        tracing::info!(
            poll_interval_seconds = config.poll_interval_seconds,
            "Transaction purger started"
        );

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    if let Err(e) = Self::purge_once(store.as_ref()).await {
                        tracing::error!(error = %e, "Error purging expired transactions");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Transaction purger shutting down");
                    break;
                }
            }
        }
    }

    /// Run a single purge pass.
    pub async fn purge_once(store: &dyn TransactionStore) -> Result<u64> {
        let purged = store
            .purge_expired()
            .await
            .context("Failed to purge expired transactions")?;

        if purged > 0 {
            tracing::info!(purged, "Purged expired transactions");
        }

        Ok(purged)
    }

    pub async fn shutdown(&self) {
        if let Err(e) = self.shutdown_tx.send(()).await {
            tracing::warn!(
                error = %e,
                "Failed to send shutdown signal to transaction purger"
            );
        }
    }
}
