//! Connection notifiers
//!
//! A notifier pushes payloads to a specific client connection and can
//! force-terminate it. Delivery is best effort: every failure is logged and
//! reported as `false`, never as an error.

#[cfg(feature = "notifier-http")]
mod gateway;
mod registry;

#[cfg(feature = "notifier-http")]
pub use gateway::HttpConnectionNotifier;
pub use registry::{ConnectionRegistry, OutboundFrame};

use async_trait::async_trait;
use invoice_core::{StatusMessage, TransactionStatus};

#[async_trait]
pub trait ConnectionNotifier: Send + Sync {
    /// Deliver `payload` to a live connection. Returns whether it was delivered.
    async fn send(&self, connection_id: &str, payload: &str) -> bool;

    /// Terminate a connection. Returns `false` if it was already gone.
    async fn disconnect(&self, connection_id: &str) -> bool;

    /// Push `{transactionId, status}` for a transaction.
    async fn send_status(
        &self,
        token: &str,
        connection_id: &str,
        status: TransactionStatus,
    ) -> bool {
        match serde_json::to_string(&StatusMessage::new(token, status)) {
            Ok(payload) => self.send(connection_id, &payload).await,
            Err(e) => {
                tracing::warn!(error = %e, token = %token, "Failed to serialize status message");
                false
            }
        }
    }
}
