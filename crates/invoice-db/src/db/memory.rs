//! In-memory store implementations
//!
//! Used for single-process development runs (`STORE_BACKEND=memory`) and
//! as test doubles. Expiry is evaluated against the wall clock on every
//! access, matching the Postgres repositories.

use async_trait::async_trait;
use chrono::Utc;
use invoice_core::{Invoice, InvoiceTransaction, TransactionStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::store::{
    ensure_persistable, InvoiceStore, StoreError, StoreResult, TransactionStore, TransitionOutcome,
};

#[derive(Clone, Default)]
pub struct MemoryTransactionStore {
    records: Arc<RwLock<HashMap<String, InvoiceTransaction>>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, expired ones included.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn create(&self, transaction: &InvoiceTransaction) -> StoreResult<()> {
        ensure_persistable(transaction.status)?;

        let mut records = self.records.write().await;
        if records.contains_key(&transaction.token) {
            return Err(StoreError::AlreadyExists(transaction.token.clone()));
        }
        records.insert(transaction.token.clone(), transaction.clone());
        Ok(())
    }

    async fn get(&self, token: &str) -> StoreResult<InvoiceTransaction> {
        let now = Utc::now();
        self.records
            .read()
            .await
            .get(token)
            .filter(|record| !record.is_expired_at(now))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(token.to_string()))
    }

    async fn update_status(&self, token: &str, status: TransactionStatus) -> StoreResult<()> {
        ensure_persistable(status)?;

        let now = Utc::now();
        let mut records = self.records.write().await;
        match records.get_mut(token) {
            Some(record) if !record.is_expired_at(now) => {
                record.status = status;
                Ok(())
            }
            _ => Err(StoreError::NotFound(token.to_string())),
        }
    }

    async fn transition_status(
        &self,
        token: &str,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> StoreResult<TransitionOutcome> {
        ensure_persistable(status)?;

        let now = Utc::now();
        let mut records = self.records.write().await;
        match records.get_mut(token) {
            Some(record) if !record.is_expired_at(now) => {
                if record.status != expected {
                    return Ok(TransitionOutcome::Conflict {
                        current: record.status,
                    });
                }
                record.status = status;
                Ok(TransitionOutcome::Applied)
            }
            _ => Err(StoreError::NotFound(token.to_string())),
        }
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        Ok((before - records.len()) as u64)
    }
}

#[derive(Clone, Default)]
pub struct MemoryInvoiceStore {
    invoices: Arc<RwLock<HashMap<(String, String), Invoice>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of `put` calls, including overwrites of an existing key.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.invoices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.invoices.read().await.is_empty()
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn put(&self, invoice: &Invoice) -> StoreResult<()> {
        let key = (invoice.customer_name.clone(), invoice.invoice_number.clone());
        self.invoices.write().await.insert(key, invoice.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(
        &self,
        customer_name: &str,
        invoice_number: &str,
    ) -> StoreResult<Option<Invoice>> {
        let key = (customer_name.to_string(), invoice_number.to_string());
        Ok(self.invoices.read().await.get(&key).cloned())
    }

    async fn list_for_customer(&self, customer_name: &str) -> StoreResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .read()
            .await
            .values()
            .filter(|invoice| invoice.customer_name == customer_name)
            .cloned()
            .collect();
        invoices.sort_by(|a, b| a.invoice_number.cmp(&b.invoice_number));
        Ok(invoices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn transaction(token: &str, ttl_seconds: i64) -> InvoiceTransaction {
        InvoiceTransaction::generated(token, "conn-1", "req-1", None, 300, ttl_seconds, Utc::now())
    }

    fn invoice(customer: &str, number: &str, token: &str) -> Invoice {
        Invoice {
            customer_name: customer.to_string(),
            invoice_number: number.to_string(),
            total_value: 10.5,
            product_id: "p1".to_string(),
            quantity: 2,
            source_transaction_token: token.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_token() {
        let store = MemoryTransactionStore::new();
        store.create(&transaction("tok", 120)).await.unwrap();
        let err = store.create(&transaction("tok", 120)).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn get_unknown_token_is_not_found() {
        let store = MemoryTransactionStore::new();
        let err = store.get("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn expired_record_is_invisible() {
        let store = MemoryTransactionStore::new();
        let mut tx = transaction("old", 120);
        tx.ttl = Utc::now() - Duration::seconds(1);
        store.create(&tx).await.unwrap();

        assert!(matches!(store.get("old").await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store
                .transition_status("old", TransactionStatus::Generated, TransactionStatus::Received)
                .await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update_status("old", TransactionStatus::Cancelled).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn transition_applies_only_from_expected_status() {
        let store = MemoryTransactionStore::new();
        store.create(&transaction("tok", 120)).await.unwrap();

        let first = store
            .transition_status("tok", TransactionStatus::Generated, TransactionStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(first, TransitionOutcome::Applied);

        let second = store
            .transition_status("tok", TransactionStatus::Generated, TransactionStatus::Received)
            .await
            .unwrap();
        assert_eq!(
            second,
            TransitionOutcome::Conflict {
                current: TransactionStatus::Cancelled
            }
        );
        assert_eq!(
            store.get("tok").await.unwrap().status,
            TransactionStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn not_found_status_is_never_persisted() {
        let store = MemoryTransactionStore::new();
        store.create(&transaction("tok", 120)).await.unwrap();
        let err = store
            .update_status("tok", TransactionStatus::NotFound)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidStatus(TransactionStatus::NotFound)));
    }

    #[tokio::test]
    async fn purge_removes_only_expired_records() {
        let store = MemoryTransactionStore::new();
        let mut expired = transaction("old", 120);
        expired.ttl = Utc::now() - Duration::seconds(5);
        store.create(&expired).await.unwrap();
        store.create(&transaction("live", 120)).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get("live").await.is_ok());
    }

    #[tokio::test]
    async fn invoice_put_is_keyed_upsert() {
        let store = MemoryInvoiceStore::new();
        store.put(&invoice("alice", "AB123", "tok-1")).await.unwrap();
        store.put(&invoice("alice", "AB123", "tok-1")).await.unwrap();
        store.put(&invoice("alice", "ZZ999", "tok-2")).await.unwrap();
        store.put(&invoice("bob", "AB123", "tok-3")).await.unwrap();

        assert_eq!(store.len().await, 3);
        assert_eq!(store.write_count(), 4);

        let alice = store.list_for_customer("alice").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].invoice_number, "AB123");

        let found = store.get("bob", "AB123").await.unwrap().unwrap();
        assert_eq!(found.source_transaction_token, "tok-3");
        assert!(store.get("carol", "AB123").await.unwrap().is_none());
    }
}
