//! Upload target for links minted by the local and in-memory storage
//! backends. The write raises the object-created event in-process.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use invoice_core::{AppError, ObjectCreatedEvent, StorageBackend};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Unix seconds after which the link is void.
    pub expires: i64,
}

#[tracing::instrument(skip(state, headers, body), fields(size_bytes = body.len()))]
pub async fn put_upload(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    if state.objects.backend_type() == StorageBackend::S3 {
        return Err(AppError::NotFound("Uploads go directly to object storage".to_string()).into());
    }

    if query.expires <= Utc::now().timestamp() {
        return Err(AppError::InvalidInput("Upload link has expired".to_string()).into());
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/json");

    state
        .objects
        .upload_with_key(&key, body.to_vec(), content_type)
        .await?;

    let event = ObjectCreatedEvent::single(state.objects.bucket(), key.as_str());
    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        if let Err(e) = pipeline.handle_object_created(&event).await {
            tracing::error!(error = %e, "Ingestion of local upload failed");
        }
    });

    Ok(StatusCode::OK)
}
