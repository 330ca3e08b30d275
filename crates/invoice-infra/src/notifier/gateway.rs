use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::ConnectionNotifier;

/// Notifier backed by a WebSocket gateway's connection management API
///
/// `GET {endpoint}/@connections/{id}` checks liveness, `POST` delivers a
/// payload and `DELETE` terminates the connection.
#[derive(Clone)]
pub struct HttpConnectionNotifier {
    http_client: Client,
    endpoint: String,
}

impl HttpConnectionNotifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client for connection notifier")?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connection_url(&self, connection_id: &str) -> String {
        format!(
            "{}/@connections/{}",
            self.endpoint,
            urlencoding::encode(connection_id)
        )
    }

    /// Whether the gateway still knows the connection.
    async fn is_registered(&self, connection_id: &str) -> bool {
        let response = self
            .http_client
            .get(self.connection_url(connection_id))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) if matches!(resp.status(), StatusCode::GONE | StatusCode::NOT_FOUND) => {
                tracing::debug!(connection_id = %connection_id, "Connection no longer registered");
                false
            }
            Ok(resp) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    status = resp.status().as_u16(),
                    "Unexpected status from connection lookup"
                );
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, connection_id = %connection_id, "Connection lookup failed");
                false
            }
        }
    }
}

#[async_trait]
impl ConnectionNotifier for HttpConnectionNotifier {
    async fn send(&self, connection_id: &str, payload: &str) -> bool {
        if !self.is_registered(connection_id).await {
            return false;
        }

        let start = std::time::Instant::now();
        let response = self
            .http_client
            .post(self.connection_url(connection_id))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(
                    connection_id = %connection_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Message delivered"
                );
                true
            }
            Ok(resp) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    status = resp.status().as_u16(),
                    "Gateway rejected message"
                );
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, connection_id = %connection_id, "Message delivery failed");
                false
            }
        }
    }

    async fn disconnect(&self, connection_id: &str) -> bool {
        if !self.is_registered(connection_id).await {
            return false;
        }

        let response = self
            .http_client
            .delete(self.connection_url(connection_id))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(connection_id = %connection_id, "Connection terminated");
                true
            }
            Ok(resp) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    status = resp.status().as_u16(),
                    "Gateway refused to terminate connection"
                );
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, connection_id = %connection_id, "Disconnect failed");
                false
            }
        }
    }
}
