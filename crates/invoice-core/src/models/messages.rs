//! Messages exchanged with clients over their persistent connection.

use serde::{Deserialize, Serialize};

use super::transaction::TransactionStatus;

/// Upload credential pushed after `getImportUrl`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadLinkMessage {
    pub url: String,
    pub expires: u64,
    pub transaction_id: String,
}

/// Status push for a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub transaction_id: String,
    pub status: TransactionStatus,
}

impl StatusMessage {
    pub fn new(transaction_id: impl Into<String>, status: TransactionStatus) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            status,
        }
    }
}

/// Client-originated frames, routed by their `action` field.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum ClientAction {
    #[serde(rename = "getImportUrl")]
    GetImportUrl,
    #[serde(rename = "cancelImport")]
    CancelImport {
        #[serde(rename = "transactionId")]
        transaction_id: String,
    },
}
