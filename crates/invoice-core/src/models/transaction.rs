use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Lifecycle status of an import transaction.
///
/// `NotFound` is only ever reported to clients; it is never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Generated,
    Received,
    Processed,
    Cancelled,
    NonValidInvoiceNumber,
    NotFound,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Generated => "GENERATED",
            TransactionStatus::Received => "RECEIVED",
            TransactionStatus::Processed => "PROCESSED",
            TransactionStatus::Cancelled => "CANCELLED",
            TransactionStatus::NonValidInvoiceNumber => "NON_VALID_INVOICE_NUMBER",
            TransactionStatus::NotFound => "NOT_FOUND",
        }
    }

    /// Whether the status may be written to the transaction store.
    pub fn is_persistable(&self) -> bool {
        !matches!(self, TransactionStatus::NotFound)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENERATED" => Ok(TransactionStatus::Generated),
            "RECEIVED" => Ok(TransactionStatus::Received),
            "PROCESSED" => Ok(TransactionStatus::Processed),
            "CANCELLED" => Ok(TransactionStatus::Cancelled),
            "NON_VALID_INVOICE_NUMBER" => Ok(TransactionStatus::NonValidInvoiceNumber),
            "NOT_FOUND" => Ok(TransactionStatus::NotFound),
            _ => Err(anyhow::anyhow!("Invalid transaction status: {}", s)),
        }
    }
}

/// One upload attempt, keyed by its single-use token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTransaction {
    /// Opaque upload token; also the object key of the uploaded file.
    pub token: String,
    pub status: TransactionStatus,
    pub connection_id: String,
    pub created_at: DateTime<Utc>,
    /// Validity window of the upload credential.
    pub expires_in_seconds: i64,
    /// Absolute expiry; after it the record reads as absent.
    pub ttl: DateTime<Utc>,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl InvoiceTransaction {
    /// A freshly issued transaction in `GENERATED`.
    pub fn generated(
        token: impl Into<String>,
        connection_id: impl Into<String>,
        request_id: impl Into<String>,
        endpoint: Option<String>,
        expires_in_seconds: i64,
        ttl_seconds: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            status: TransactionStatus::Generated,
            connection_id: connection_id.into(),
            created_at: now,
            expires_in_seconds,
            ttl: now + Duration::seconds(ttl_seconds),
            request_id: request_id.into(),
            endpoint,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.ttl <= now
    }
}
