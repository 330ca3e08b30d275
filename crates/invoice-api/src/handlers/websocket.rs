//! In-process WebSocket connections
//!
//! Each socket is registered in the [`ConnectionRegistry`]; pushes queued
//! there are written by a per-socket writer, and text frames are parsed as
//! client actions.

use crate::error::HttpAppError;
use crate::handlers::connection_messages::dispatch_action;
use crate::state::AppState;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use invoice_core::{AppError, ClientAction};
use invoice_infra::{ConnectionRegistry, OutboundFrame};
use std::sync::Arc;
use uuid::Uuid;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<Response, HttpAppError> {
    let Some(registry) = state.registry.clone() else {
        return Err(AppError::NotFound(
            "Connections are managed by an external gateway".to_string(),
        )
        .into());
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, registry)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, registry: ConnectionRegistry) {
    let (connection_id, mut outbound) = registry.register().await;
    tracing::info!(connection_id = %connection_id, "Client connected");

    let (mut sink, mut stream) = socket.split();

    let writer = async {
        while let Some(frame) = outbound.recv().await {
            match frame {
                OutboundFrame::Text(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                OutboundFrame::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    };

    let reader = async {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => {
                    let state = state.clone();
                    let connection_id = connection_id.clone();
                    let body = text.to_string();
                    tokio::spawn(async move {
                        handle_text_frame(&state, &connection_id, &body).await;
                    });
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = writer => {}
        _ = reader => {}
    }

    registry.unregister(&connection_id).await;
    tracing::info!(connection_id = %connection_id, "Client disconnected");
}

async fn handle_text_frame(state: &AppState, connection_id: &str, body: &str) {
    let action = match serde_json::from_str::<ClientAction>(body) {
        Ok(action) => action,
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, error = %e, "Unrecognised client message");
            return;
        }
    };

    let request_id = Uuid::new_v4().to_string();
    if let Err(HttpAppError(e)) = dispatch_action(state, connection_id, &request_id, action).await {
        tracing::error!(
            connection_id = %connection_id,
            request_id = %request_id,
            error = %e,
            "Client action failed"
        );
    }
}
