//! Test helpers: build AppState and router over in-memory backends.
//!
//! Run from workspace root: `cargo test -p invoice-api`.

use axum::Router;
use axum_test::TestServer;
use invoice_api::constants;
use invoice_api::setup::routes;
use invoice_api::state::AppState;
use invoice_core::Config;
use invoice_db::{MemoryInvoiceStore, MemoryTransactionStore, TransactionStore};
use invoice_infra::{ConnectionRegistry, OutboundFrame};
use invoice_pipeline::{ImportPipeline, PipelineDeps, PipelineSettings};
use invoice_storage::MemoryStorage;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub const TEST_BUCKET: &str = "invoices-test";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub struct TestApp {
    pub server: TestServer,
    pub registry: ConnectionRegistry,
    pub transactions: MemoryTransactionStore,
    pub invoices: MemoryInvoiceStore,
    pub objects: MemoryStorage,
}

pub fn setup_test_app() -> TestApp {
    let transactions = MemoryTransactionStore::new();
    setup_test_app_with(transactions.clone(), Arc::new(transactions))
}

/// Like [`setup_test_app`], with the pipeline reading and writing
/// transactions through `store`.
pub fn setup_test_app_with(
    transactions: MemoryTransactionStore,
    store: Arc<dyn TransactionStore>,
) -> TestApp {
    build_test_app(transactions, store, |app| TestServer::new(app.into_make_service()))
}

/// Served over a real HTTP listener, which WebSocket upgrades need.
pub fn setup_ws_test_app() -> TestApp {
    let transactions = MemoryTransactionStore::new();
    build_test_app(transactions.clone(), Arc::new(transactions), |app| {
        TestServer::builder().http_transport().build(app)
    })
}

fn build_test_app(
    transactions: MemoryTransactionStore,
    store: Arc<dyn TransactionStore>,
    serve: impl FnOnce(Router) -> anyhow::Result<TestServer>,
) -> TestApp {
    let invoices = MemoryInvoiceStore::new();
    let objects = MemoryStorage::new(TEST_BUCKET);
    let registry = ConnectionRegistry::new();
    let config = Config::default();

    let deps = PipelineDeps {
        transactions: store,
        invoices: Arc::new(invoices.clone()),
        objects: Arc::new(objects.clone()),
        notifier: Arc::new(registry.clone()),
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        pipeline: ImportPipeline::new(deps, PipelineSettings::from(&config)),
        objects: Arc::new(objects.clone()),
        registry: Some(registry.clone()),
        pool: None,
        purger: None,
    });

    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = serve(app).expect("Failed to create test server");

    TestApp {
        server,
        registry,
        transactions,
        invoices,
        objects,
    }
}

pub fn drain(rx: &mut UnboundedReceiver<OutboundFrame>) -> Vec<OutboundFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

pub fn json_frames(frames: &[OutboundFrame]) -> Vec<Value> {
    frames
        .iter()
        .filter_map(|frame| match frame {
            OutboundFrame::Text(text) => serde_json::from_str(text).ok(),
            OutboundFrame::Close => None,
        })
        .collect()
}

pub fn statuses(frames: &[OutboundFrame]) -> Vec<String> {
    json_frames(frames)
        .iter()
        .filter_map(|value| value["status"].as_str().map(String::from))
        .collect()
}

pub fn invoice_body(number: &str) -> String {
    serde_json::json!({
        "invoiceNumber": number,
        "totalValue": 10.5,
        "productId": "p1",
        "quantity": 2,
        "customerName": "alice"
    })
    .to_string()
}

pub fn object_created(key: &str) -> Value {
    serde_json::json!({
        "Records": [
            { "s3": { "bucket": { "name": TEST_BUCKET }, "object": { "key": key } } }
        ]
    })
}
