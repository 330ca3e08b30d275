use chrono::Utc;
use invoice_core::{InvoiceTransaction, UploadLinkMessage};
use uuid::Uuid;

use crate::context::{PipelineDeps, PipelineSettings};
use crate::error::PipelineResult;

/// Result of issuing an upload link
#[derive(Debug, Clone)]
pub struct IssuedLink {
    pub token: String,
    pub url: String,
    pub expires: u64,
    /// Whether the link reached the requesting connection.
    pub delivered: bool,
}

/// Mints a transaction token and a time-limited upload URL for it
pub struct UploadLinkIssuer {
    deps: PipelineDeps,
    settings: PipelineSettings,
}

impl UploadLinkIssuer {
    pub fn new(deps: PipelineDeps, settings: PipelineSettings) -> Self {
        Self { deps, settings }
    }

    /// Issue a link for `connection_id`.
    ///
    /// The transaction is recorded as `GENERATED` before the link is pushed,
    /// so an upload can never race ahead of its own record. A failed push is
    /// logged and does not undo the record; it expires on its own.
    #[tracing::instrument(skip(self), fields(token))]
    pub async fn issue(&self, connection_id: &str, request_id: &str) -> PipelineResult<IssuedLink> {
        let token = Uuid::new_v4().to_string();
        tracing::Span::current().record("token", token.as_str());

        let expires = self.settings.upload_url_expires.as_secs();
        let url = self
            .deps
            .objects
            .presigned_put_url(&token, self.settings.upload_url_expires)
            .await?;

        let transaction = InvoiceTransaction::generated(
            token.as_str(),
            connection_id,
            request_id,
            self.settings.notifier_endpoint.clone(),
            expires as i64,
            self.settings.transaction_ttl_secs,
            Utc::now(),
        );
        self.deps.transactions.create(&transaction).await?;

        let message = UploadLinkMessage {
            url: url.clone(),
            expires,
            transaction_id: token.clone(),
        };
        let payload = serde_json::to_string(&message)?;
        let delivered = self.deps.notifier.send(connection_id, &payload).await;

        if delivered {
            tracing::info!(connection_id = %connection_id, "Upload link issued");
        } else {
            tracing::warn!(
                connection_id = %connection_id,
                "Upload link recorded but could not be delivered"
            );
        }

        Ok(IssuedLink {
            token,
            url,
            expires,
            delivered,
        })
    }
}
