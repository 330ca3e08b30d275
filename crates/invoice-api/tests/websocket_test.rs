mod helpers;

use axum_test::WsMessage;
use helpers::*;
use invoice_core::TransactionStatus;
use invoice_db::TransactionStore;
use serde_json::{json, Value};
use std::time::Duration;

async fn wait_for_connections(app: &TestApp, expected: usize) {
    for _ in 0..100 {
        if app.registry.connection_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("connection count never reached {}", expected);
}

#[tokio::test]
async fn test_socket_receives_link_and_is_closed_after_cancel() {
    let app = setup_ws_test_app();

    let mut socket = app.server.get_websocket("/ws").await.into_websocket().await;
    wait_for_connections(&app, 1).await;

    socket.send_json(&json!({ "action": "getImportUrl" })).await;
    let link: Value = socket.receive_json().await;
    let token = link["transactionId"].as_str().unwrap().to_string();
    assert!(link["url"].as_str().unwrap().contains(&token));
    assert!(link["expires"].as_u64().is_some());

    socket
        .send_json(&json!({ "action": "cancelImport", "transactionId": token }))
        .await;
    let status: Value = socket.receive_json().await;
    assert_eq!(status, json!({ "transactionId": token, "status": "CANCELLED" }));

    assert!(matches!(socket.receive_message().await, WsMessage::Close(_)));
    wait_for_connections(&app, 0).await;

    assert_eq!(
        app.transactions.get(&token).await.unwrap().status,
        TransactionStatus::Cancelled
    );
}

#[tokio::test]
async fn test_unparseable_frame_keeps_socket_open() {
    let app = setup_ws_test_app();

    let mut socket = app.server.get_websocket("/ws").await.into_websocket().await;
    wait_for_connections(&app, 1).await;

    socket.send_text("not json").await;
    socket
        .send_json(&json!({ "action": "cancelImport", "transactionId": "ghost" }))
        .await;

    let status: Value = socket.receive_json().await;
    assert_eq!(status["status"], "NOT_FOUND");
    assert!(matches!(socket.receive_message().await, WsMessage::Close(_)));
    wait_for_connections(&app, 0).await;
}
