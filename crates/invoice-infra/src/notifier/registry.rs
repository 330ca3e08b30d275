use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::ConnectionNotifier;

/// Frame queued for a connection's socket writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Close,
}

/// In-process registry of live client connections
///
/// Each connection is an unbounded channel drained by whoever owns the
/// socket. A send to a connection whose receiver is gone unregisters it.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<OutboundFrame>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection under a generated id
    pub async fn register(&self) -> (String, mpsc::UnboundedReceiver<OutboundFrame>) {
        let connection_id = Uuid::new_v4().to_string();
        let rx = self.register_with_id(&connection_id).await;
        (connection_id, rx)
    }

    /// Register a connection under a caller-chosen id, replacing any previous one
    pub async fn register_with_id(
        &self,
        connection_id: &str,
    ) -> mpsc::UnboundedReceiver<OutboundFrame> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections
            .write()
            .await
            .insert(connection_id.to_string(), tx);
        tracing::debug!(connection_id = %connection_id, "Connection registered");
        rx
    }

    pub async fn unregister(&self, connection_id: &str) {
        if self.connections.write().await.remove(connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
    }

    pub async fn is_connected(&self, connection_id: &str) -> bool {
        self.connections
            .read()
            .await
            .get(connection_id)
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl ConnectionNotifier for ConnectionRegistry {
    async fn send(&self, connection_id: &str, payload: &str) -> bool {
        let sender = self.connections.read().await.get(connection_id).cloned();
        let Some(sender) = sender else {
            tracing::warn!(connection_id = %connection_id, "Connection not registered, dropping message");
            return false;
        };

        if sender.send(OutboundFrame::Text(payload.to_string())).is_err() {
            tracing::warn!(connection_id = %connection_id, "Connection gone, dropping message");
            self.unregister(connection_id).await;
            return false;
        }

        true
    }

    async fn disconnect(&self, connection_id: &str) -> bool {
        let sender = self.connections.write().await.remove(connection_id);
        match sender {
            Some(sender) => {
                let delivered = sender.send(OutboundFrame::Close).is_ok();
                tracing::debug!(connection_id = %connection_id, delivered, "Connection closed");
                delivered
            }
            None => {
                tracing::debug!(connection_id = %connection_id, "Disconnect for unknown connection");
                false
            }
        }
    }
}
