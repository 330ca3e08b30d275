//! End-to-end pipeline tests against the in-memory stores.

use async_trait::async_trait;
use chrono::Utc;
use invoice_core::{Invoice, InvoiceTransaction, ObjectCreatedEvent, TransactionStatus};
use invoice_db::{
    InvoiceStore, MemoryInvoiceStore, MemoryTransactionStore, StoreError, StoreResult,
    TransactionStore, TransitionOutcome,
};
use invoice_infra::{ConnectionRegistry, OutboundFrame};
use invoice_pipeline::{
    CancelOutcome, ImportPipeline, IngestionOutcome, PipelineDeps, PipelineError,
    PipelineSettings,
};
use invoice_storage::{MemoryStorage, ObjectAccess, StorageBackend, StorageResult};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const BUCKET: &str = "invoices-test";

struct Harness {
    pipeline: ImportPipeline,
    transactions: MemoryTransactionStore,
    invoices: MemoryInvoiceStore,
    objects: MemoryStorage,
    registry: ConnectionRegistry,
}

fn harness() -> Harness {
    harness_with(|deps| deps, PipelineSettings::default())
}

fn harness_with(
    customize: impl FnOnce(PipelineDeps) -> PipelineDeps,
    settings: PipelineSettings,
) -> Harness {
    let transactions = MemoryTransactionStore::new();
    let invoices = MemoryInvoiceStore::new();
    let objects = MemoryStorage::new(BUCKET);
    let registry = ConnectionRegistry::new();

    let deps = customize(PipelineDeps {
        transactions: Arc::new(transactions.clone()),
        invoices: Arc::new(invoices.clone()),
        objects: Arc::new(objects.clone()),
        notifier: Arc::new(registry.clone()),
    });

    Harness {
        pipeline: ImportPipeline::new(deps, settings),
        transactions,
        invoices,
        objects,
        registry,
    }
}

fn drain(rx: &mut UnboundedReceiver<OutboundFrame>) -> Vec<OutboundFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

fn json_frames(frames: &[OutboundFrame]) -> Vec<Value> {
    frames
        .iter()
        .filter_map(|frame| match frame {
            OutboundFrame::Text(text) => serde_json::from_str(text).ok(),
            OutboundFrame::Close => None,
        })
        .collect()
}

fn statuses(frames: &[OutboundFrame]) -> Vec<String> {
    json_frames(frames)
        .iter()
        .filter_map(|value| value["status"].as_str().map(String::from))
        .collect()
}

fn invoice_json(number: &str) -> String {
    format!(
        r#"{{"invoiceNumber":"{}","totalValue":99.5,"productId":"prod-1","quantity":3,"customerName":"alice"}}"#,
        number
    )
}

fn event(token: &str) -> ObjectCreatedEvent {
    ObjectCreatedEvent::single(BUCKET, token)
}

#[tokio::test]
async fn upload_link_records_generated_transaction() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;

    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    assert!(link.delivered);
    assert_eq!(link.expires, 300);

    let stored = h.transactions.get(&link.token).await.unwrap();
    assert_eq!(stored.status, TransactionStatus::Generated);
    assert_eq!(stored.connection_id, conn);
    assert_eq!(stored.request_id, "req-1");
    assert_eq!(stored.expires_in_seconds, 300);
    assert_eq!((stored.ttl - stored.created_at).num_seconds(), 120);

    let frames = json_frames(&drain(&mut rx));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["transactionId"], link.token.as_str());
    assert_eq!(frames[0]["expires"], 300);
    assert_eq!(frames[0]["url"], link.url.as_str());
}

#[tokio::test]
async fn upload_link_tokens_are_unique() {
    let h = harness();
    let (conn, _rx) = h.registry.register().await;

    let first = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    let second = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    assert_ne!(first.token, second.token);
    assert_eq!(h.transactions.len().await, 2);
}

#[tokio::test]
async fn upload_link_survives_gone_connection() {
    let h = harness();

    let link = h
        .pipeline
        .issue_upload_link("never-connected", "req-1")
        .await
        .unwrap();
    assert!(!link.delivered);
    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::Generated
    );
}

#[tokio::test]
async fn valid_upload_is_processed() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;
    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    drain(&mut rx);

    h.objects.put_object(&link.token, invoice_json("AB123")).await;
    let outcomes = h
        .pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![IngestionOutcome::Processed {
            token: link.token.clone(),
            customer_name: "alice".to_string(),
            invoice_number: "AB123".to_string(),
        }]
    );
    assert_eq!(statuses(&drain(&mut rx)), vec!["RECEIVED", "PROCESSED"]);

    let invoice = h.invoices.get("alice", "AB123").await.unwrap().unwrap();
    assert_eq!(invoice.total_value, 99.5);
    assert_eq!(invoice.quantity, 3);
    assert_eq!(invoice.product_id, "prod-1");
    assert_eq!(invoice.source_transaction_token, link.token);

    assert!(!h.objects.has_object(&link.token).await);
    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::Processed
    );
}

#[tokio::test]
async fn four_character_invoice_number_is_rejected() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;
    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    drain(&mut rx);

    h.objects.put_object(&link.token, invoice_json("AB12")).await;
    let outcomes = h
        .pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![IngestionOutcome::Rejected {
            token: link.token.clone()
        }]
    );
    let frames = drain(&mut rx);
    assert_eq!(
        statuses(&frames),
        vec!["RECEIVED", "NON_VALID_INVOICE_NUMBER"]
    );
    assert_eq!(frames.last(), Some(&OutboundFrame::Close));
    assert!(!h.registry.is_connected(&conn).await);

    assert!(h.invoices.is_empty().await);
    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::NonValidInvoiceNumber
    );
}

#[tokio::test]
async fn malformed_file_is_rejected() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;
    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    drain(&mut rx);

    h.objects
        .put_object(&link.token, r#"{"invoiceNumber":"AB123"}"#)
        .await;
    h.pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap();

    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::NonValidInvoiceNumber
    );
    assert!(h.invoices.is_empty().await);
}

#[tokio::test]
async fn cancel_then_upload_never_processes() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;
    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    drain(&mut rx);

    let outcome = h.pipeline.cancel_import(&link.token, &conn).await.unwrap();
    assert_eq!(outcome, CancelOutcome::Cancelled);
    let frames = drain(&mut rx);
    assert_eq!(statuses(&frames), vec!["CANCELLED"]);
    assert_eq!(frames.last(), Some(&OutboundFrame::Close));

    h.objects.put_object(&link.token, invoice_json("AB123")).await;
    let outcomes = h
        .pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![IngestionOutcome::Skipped {
            token: link.token.clone(),
            status: TransactionStatus::Cancelled,
        }]
    );
    assert!(h.invoices.is_empty().await);
    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::Cancelled
    );
}

#[tokio::test]
async fn cancel_after_processing_is_refused() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;
    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();

    h.objects.put_object(&link.token, invoice_json("AB123")).await;
    h.pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap();
    drain(&mut rx);

    let outcome = h.pipeline.cancel_import(&link.token, &conn).await.unwrap();
    assert_eq!(
        outcome,
        CancelOutcome::NotCancellable {
            status: TransactionStatus::Processed
        }
    );
    assert_eq!(statuses(&drain(&mut rx)), vec!["PROCESSED"]);
    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::Processed
    );
}

#[tokio::test]
async fn cancel_unknown_token_reports_not_found() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;

    let outcome = h.pipeline.cancel_import("no-such-token", &conn).await.unwrap();
    assert_eq!(outcome, CancelOutcome::NotFound);

    let frames = drain(&mut rx);
    let messages = json_frames(&frames);
    assert_eq!(messages[0]["transactionId"], "no-such-token");
    assert_eq!(messages[0]["status"], "NOT_FOUND");
    assert_eq!(frames.last(), Some(&OutboundFrame::Close));
    assert!(h.transactions.is_empty().await);
}

#[tokio::test]
async fn expired_transaction_behaves_as_absent() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;

    let mut expired =
        InvoiceTransaction::generated("tok-old", &conn, "req-1", None, 300, 120, Utc::now());
    expired.ttl = Utc::now() - chrono::Duration::seconds(1);
    h.transactions.create(&expired).await.unwrap();

    h.objects.put_object("tok-old", invoice_json("AB123")).await;
    let outcomes = h
        .pipeline
        .handle_object_created(&event("tok-old"))
        .await
        .unwrap();
    assert_eq!(
        outcomes,
        vec![IngestionOutcome::UnknownTransaction {
            token: "tok-old".to_string()
        }]
    );
    assert!(h.invoices.is_empty().await);

    let outcome = h.pipeline.cancel_import("tok-old", &conn).await.unwrap();
    assert_eq!(outcome, CancelOutcome::NotFound);
    assert_eq!(statuses(&drain(&mut rx)), vec!["NOT_FOUND"]);
}

#[tokio::test]
async fn redelivered_event_does_not_duplicate_invoice() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;
    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    drain(&mut rx);

    h.objects.put_object(&link.token, invoice_json("AB123")).await;
    h.pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap();
    let outcomes = h
        .pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![IngestionOutcome::Skipped {
            token: link.token.clone(),
            status: TransactionStatus::Processed,
        }]
    );
    assert_eq!(h.invoices.write_count(), 1);
    assert_eq!(h.invoices.len().await, 1);
    assert_eq!(
        statuses(&drain(&mut rx)),
        vec!["RECEIVED", "PROCESSED", "PROCESSED"]
    );
}

#[tokio::test]
async fn received_transaction_resumes_on_redelivery() {
    let h = harness();
    let (conn, mut rx) = h.registry.register().await;
    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    drain(&mut rx);

    // A previous attempt got as far as RECEIVED.
    h.transactions
        .update_status(&link.token, TransactionStatus::Received)
        .await
        .unwrap();
    h.objects.put_object(&link.token, invoice_json("AB123")).await;

    h.pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap();

    assert_eq!(statuses(&drain(&mut rx)), vec!["PROCESSED"]);
    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::Processed
    );
    assert_eq!(h.invoices.len().await, 1);
}

#[tokio::test]
async fn every_record_of_an_event_is_ingested() {
    let h = harness();
    let (conn, _rx) = h.registry.register().await;
    let first = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    let second = h.pipeline.issue_upload_link(&conn, "req-2").await.unwrap();

    h.objects.put_object(&first.token, invoice_json("AB123")).await;
    h.objects.put_object(&second.token, invoice_json("CD456")).await;

    let body = serde_json::json!({
        "Records": [
            { "s3": { "bucket": { "name": BUCKET }, "object": { "key": first.token } } },
            { "s3": { "bucket": { "name": BUCKET }, "object": { "key": second.token } } }
        ]
    });
    let event: ObjectCreatedEvent = serde_json::from_value(body).unwrap();

    let outcomes = h.pipeline.handle_object_created(&event).await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(h.invoices.list_for_customer("alice").await.unwrap().len(), 2);
}

/// Reports every record as still `GENERATED`, as a read that raced a
/// concurrent update would.
struct StaleReadStore {
    inner: MemoryTransactionStore,
}

#[async_trait]
impl TransactionStore for StaleReadStore {
    async fn create(&self, transaction: &InvoiceTransaction) -> StoreResult<()> {
        self.inner.create(transaction).await
    }

    async fn get(&self, token: &str) -> StoreResult<InvoiceTransaction> {
        let mut transaction = self.inner.get(token).await?;
        transaction.status = TransactionStatus::Generated;
        Ok(transaction)
    }

    async fn update_status(&self, token: &str, status: TransactionStatus) -> StoreResult<()> {
        self.inner.update_status(token, status).await
    }

    async fn transition_status(
        &self,
        token: &str,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> StoreResult<TransitionOutcome> {
        self.inner.transition_status(token, expected, status).await
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        self.inner.purge_expired().await
    }
}

#[tokio::test]
async fn late_ingestion_loses_to_cancellation() {
    let inner = MemoryTransactionStore::new();
    let stale = inner.clone();
    let h = harness_with(
        move |mut deps| {
            deps.transactions = Arc::new(StaleReadStore { inner: stale });
            deps
        },
        PipelineSettings::default(),
    );
    let (conn, mut rx) = h.registry.register().await;

    let tx = InvoiceTransaction::generated("tok-race", &conn, "req-1", None, 300, 120, Utc::now());
    inner.create(&tx).await.unwrap();
    inner
        .update_status("tok-race", TransactionStatus::Cancelled)
        .await
        .unwrap();

    h.objects.put_object("tok-race", invoice_json("AB123")).await;
    let outcomes = h
        .pipeline
        .handle_object_created(&event("tok-race"))
        .await
        .unwrap();

    assert_eq!(
        outcomes,
        vec![IngestionOutcome::Skipped {
            token: "tok-race".to_string(),
            status: TransactionStatus::Cancelled,
        }]
    );
    assert_eq!(statuses(&drain(&mut rx)), vec!["CANCELLED"]);
    assert!(h.invoices.is_empty().await);
    assert_eq!(
        inner.get("tok-race").await.unwrap().status,
        TransactionStatus::Cancelled
    );
}

#[tokio::test]
async fn late_cancellation_loses_to_ingestion() {
    let inner = MemoryTransactionStore::new();
    let stale = inner.clone();
    let h = harness_with(
        move |mut deps| {
            deps.transactions = Arc::new(StaleReadStore { inner: stale });
            deps
        },
        PipelineSettings::default(),
    );
    let (conn, mut rx) = h.registry.register().await;

    let tx = InvoiceTransaction::generated("tok-race", &conn, "req-1", None, 300, 120, Utc::now());
    inner.create(&tx).await.unwrap();
    inner
        .update_status("tok-race", TransactionStatus::Received)
        .await
        .unwrap();

    let outcome = h.pipeline.cancel_import("tok-race", &conn).await.unwrap();
    assert_eq!(
        outcome,
        CancelOutcome::NotCancellable {
            status: TransactionStatus::Received
        }
    );
    assert_eq!(statuses(&drain(&mut rx)), vec!["RECEIVED"]);
    assert_eq!(
        inner.get("tok-race").await.unwrap().status,
        TransactionStatus::Received
    );
}

struct UnavailableTransactionStore;

#[async_trait]
impl TransactionStore for UnavailableTransactionStore {
    async fn create(&self, _transaction: &InvoiceTransaction) -> StoreResult<()> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn get(&self, _token: &str) -> StoreResult<InvoiceTransaction> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn update_status(&self, _token: &str, _status: TransactionStatus) -> StoreResult<()> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn transition_status(
        &self,
        _token: &str,
        _expected: TransactionStatus,
        _status: TransactionStatus,
    ) -> StoreResult<TransitionOutcome> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

#[tokio::test]
async fn store_outage_surfaces_as_dependency_failure() {
    let h = harness_with(
        |mut deps| {
            deps.transactions = Arc::new(UnavailableTransactionStore);
            deps
        },
        PipelineSettings::default(),
    );
    let (conn, mut rx) = h.registry.register().await;

    let err = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap_err();
    assert!(err.is_dependency_failure());
    assert!(drain(&mut rx).is_empty());

    let err = h
        .pipeline
        .handle_object_created(&event("tok-1"))
        .await
        .unwrap_err();
    assert!(err.is_dependency_failure());

    // The requester is still disconnected when cancellation fails.
    let err = h.pipeline.cancel_import("tok-1", &conn).await.unwrap_err();
    assert!(err.is_dependency_failure());
    assert_eq!(drain(&mut rx), vec![OutboundFrame::Close]);
}

/// Transaction store whose reads stall past a test budget.
struct SlowTransactionStore {
    inner: MemoryTransactionStore,
    delay: Duration,
}

#[async_trait]
impl TransactionStore for SlowTransactionStore {
    async fn create(&self, transaction: &InvoiceTransaction) -> StoreResult<()> {
        self.inner.create(transaction).await
    }

    async fn get(&self, token: &str) -> StoreResult<InvoiceTransaction> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(token).await
    }

    async fn update_status(&self, token: &str, status: TransactionStatus) -> StoreResult<()> {
        self.inner.update_status(token, status).await
    }

    async fn transition_status(
        &self,
        token: &str,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> StoreResult<TransitionOutcome> {
        self.inner.transition_status(token, expected, status).await
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        self.inner.purge_expired().await
    }
}

#[tokio::test]
async fn cancellation_past_budget_still_disconnects() {
    let settings = PipelineSettings {
        handler_timeout: Duration::from_millis(50),
        ..PipelineSettings::default()
    };
    let h = harness_with(
        |mut deps| {
            deps.transactions = Arc::new(SlowTransactionStore {
                inner: MemoryTransactionStore::new(),
                delay: Duration::from_millis(300),
            });
            deps
        },
        settings,
    );
    let (conn, mut rx) = h.registry.register().await;

    let err = h.pipeline.cancel_import("ghost", &conn).await.unwrap_err();
    assert!(matches!(err, PipelineError::Timeout { operation: "cancel_import", .. }));
    assert_eq!(drain(&mut rx), vec![OutboundFrame::Close]);
    assert!(!h.registry.is_connected(&conn).await);
}

/// Object storage whose downloads never finish within a test budget.
struct SlowObjectStorage {
    inner: MemoryStorage,
    delay: Duration,
}

#[async_trait]
impl ObjectAccess for SlowObjectStorage {
    async fn presigned_put_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        self.inner.presigned_put_url(key, expires_in).await
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        tokio::time::sleep(self.delay).await;
        self.inner.download(key).await
    }

    async fn upload_with_key(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.inner.upload_with_key(key, data, content_type).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[tokio::test]
async fn slow_dependency_hits_handler_budget_and_resumes() {
    let settings = PipelineSettings {
        handler_timeout: Duration::from_millis(50),
        ..PipelineSettings::default()
    };
    let objects = MemoryStorage::new(BUCKET);
    let slow = objects.clone();
    let h = harness_with(
        move |mut deps| {
            deps.objects = Arc::new(SlowObjectStorage {
                inner: slow,
                delay: Duration::from_millis(500),
            });
            deps
        },
        settings,
    );
    let (conn, _rx) = h.registry.register().await;
    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    objects.put_object(&link.token, invoice_json("AB123")).await;

    let err = h
        .pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Timeout { operation: "ingestion", .. }));
    assert!(err.is_dependency_failure());

    // The status written before the budget ran out stays.
    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::Received
    );
    assert!(h.invoices.is_empty().await);
}

/// Invoice store that rejects its first `failures` writes.
struct FlakyInvoiceStore {
    inner: MemoryInvoiceStore,
    failures: AtomicUsize,
}

#[async_trait]
impl InvoiceStore for FlakyInvoiceStore {
    async fn put(&self, invoice: &Invoice) -> StoreResult<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("invoice table offline".to_string()));
        }
        self.inner.put(invoice).await
    }

    async fn get(&self, customer_name: &str, invoice_number: &str) -> StoreResult<Option<Invoice>> {
        self.inner.get(customer_name, invoice_number).await
    }

    async fn list_for_customer(&self, customer_name: &str) -> StoreResult<Vec<Invoice>> {
        self.inner.list_for_customer(customer_name).await
    }
}

#[tokio::test]
async fn failed_invoice_write_keeps_transaction_retryable() {
    let invoices = MemoryInvoiceStore::new();
    let flaky = invoices.clone();
    let h = harness_with(
        move |mut deps| {
            deps.invoices = Arc::new(FlakyInvoiceStore {
                inner: flaky,
                failures: AtomicUsize::new(1),
            });
            deps
        },
        PipelineSettings::default(),
    );
    let (conn, mut rx) = h.registry.register().await;
    let link = h.pipeline.issue_upload_link(&conn, "req-1").await.unwrap();
    h.objects.put_object(&link.token, invoice_json("AB123")).await;
    drain(&mut rx);

    let err = h
        .pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap_err();
    assert!(err.is_dependency_failure());

    // Nothing past the failed write took effect.
    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::Received
    );
    assert!(h.objects.has_object(&link.token).await);
    assert_eq!(statuses(&drain(&mut rx)), vec!["RECEIVED"]);

    let outcomes = h
        .pipeline
        .handle_object_created(&event(&link.token))
        .await
        .unwrap();
    assert!(matches!(outcomes[0], IngestionOutcome::Processed { .. }));
    assert_eq!(
        h.transactions.get(&link.token).await.unwrap().status,
        TransactionStatus::Processed
    );
    assert!(!h.objects.has_object(&link.token).await);
    assert_eq!(invoices.len().await, 1);
    assert_eq!(statuses(&drain(&mut rx)), vec!["PROCESSED"]);
}
