use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MIN_INVOICE_NUMBER_LEN;

/// Contents of an uploaded invoice file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFile {
    pub invoice_number: String,
    pub total_value: f64,
    pub product_id: String,
    pub quantity: i64,
    pub customer_name: String,
}

impl InvoiceFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Invoice numbers are counted in characters, not bytes.
    pub fn has_valid_invoice_number(&self) -> bool {
        self.invoice_number.chars().count() >= MIN_INVOICE_NUMBER_LEN
    }
}

/// A committed invoice, keyed by `(customer_name, invoice_number)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub customer_name: String,
    pub invoice_number: String,
    pub total_value: f64,
    pub product_id: String,
    pub quantity: i64,
    pub source_transaction_token: String,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn from_file(file: InvoiceFile, token: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            customer_name: file.customer_name,
            invoice_number: file.invoice_number,
            total_value: file.total_value,
            product_id: file.product_id,
            quantity: file.quantity,
            source_transaction_token: token.into(),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(number: &str) -> InvoiceFile {
        InvoiceFile {
            invoice_number: number.to_string(),
            total_value: 10.5,
            product_id: "p1".to_string(),
            quantity: 2,
            customer_name: "alice".to_string(),
        }
    }

    #[test]
    fn parses_camel_case_payload() {
        let raw = br#"{"invoiceNumber":"AB123","totalValue":10.5,"productId":"p1","quantity":2,"customerName":"alice"}"#;
        let file = InvoiceFile::parse(raw).unwrap();
        assert_eq!(file, file_with("AB123"));
    }

    #[test]
    fn rejects_missing_fields() {
        let raw = br#"{"invoiceNumber":"AB123","totalValue":10.5}"#;
        assert!(InvoiceFile::parse(raw).is_err());
        assert!(InvoiceFile::parse(b"not json").is_err());
    }

    #[test]
    fn invoice_number_length_boundary() {
        assert!(!file_with("AB12").has_valid_invoice_number());
        assert!(file_with("AB123").has_valid_invoice_number());
        assert!(!file_with("").has_valid_invoice_number());
    }

    #[test]
    fn invoice_number_counts_characters() {
        // four characters, eight bytes
        assert!(!file_with("ññññ").has_valid_invoice_number());
        assert!(file_with("ñññññ").has_valid_invoice_number());
    }

    #[test]
    fn invoice_keeps_file_values_and_source_token() {
        let now = Utc::now();
        let invoice = Invoice::from_file(file_with("AB123"), "tok-1", now);
        assert_eq!(invoice.customer_name, "alice");
        assert_eq!(invoice.invoice_number, "AB123");
        assert_eq!(invoice.total_value, 10.5);
        assert_eq!(invoice.quantity, 2);
        assert_eq!(invoice.source_transaction_token, "tok-1");
        assert_eq!(invoice.created_at, now);
    }
}
