//! Object-created event intake.

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use invoice_core::{ObjectCreatedEvent, TransactionStatus};
use invoice_pipeline::IngestionOutcome;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct IngestionSummary {
    pub token: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
}

impl From<&IngestionOutcome> for IngestionSummary {
    fn from(outcome: &IngestionOutcome) -> Self {
        match outcome {
            IngestionOutcome::Processed { token, .. } => Self {
                token: token.clone(),
                outcome: "processed",
                status: Some(TransactionStatus::Processed),
            },
            IngestionOutcome::Rejected { token } => Self {
                token: token.clone(),
                outcome: "rejected",
                status: Some(TransactionStatus::NonValidInvoiceNumber),
            },
            IngestionOutcome::Skipped { token, status } => Self {
                token: token.clone(),
                outcome: "skipped",
                status: Some(*status),
            },
            IngestionOutcome::UnknownTransaction { token } => Self {
                token: token.clone(),
                outcome: "unknown_transaction",
                status: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ObjectEventResponse {
    pub results: Vec<IngestionSummary>,
}

/// Any failed record fails the whole request so the sender redelivers it.
#[tracing::instrument(skip_all, fields(records = event.records.len()))]
pub async fn post_object_created(
    State(state): State<Arc<AppState>>,
    ValidatedJson(event): ValidatedJson<ObjectCreatedEvent>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcomes = state.pipeline.handle_object_created(&event).await?;

    Ok(Json(ObjectEventResponse {
        results: outcomes.iter().map(IngestionSummary::from).collect(),
    }))
}
