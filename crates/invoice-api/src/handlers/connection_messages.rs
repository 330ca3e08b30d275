//! Client actions forwarded by a connection gateway over HTTP.

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use invoice_core::ClientAction;
use invoice_infra::RequestId;
use std::sync::Arc;

/// Route one client action to the pipeline.
///
/// Outcomes reach the client as status pushes; only failures surface here.
pub(crate) async fn dispatch_action(
    state: &AppState,
    connection_id: &str,
    request_id: &str,
    action: ClientAction,
) -> Result<(), HttpAppError> {
    match action {
        ClientAction::GetImportUrl => {
            state
                .pipeline
                .issue_upload_link(connection_id, request_id)
                .await?;
        }
        ClientAction::CancelImport { transaction_id } => {
            state
                .pipeline
                .cancel_import(&transaction_id, connection_id)
                .await?;
        }
    }
    Ok(())
}

#[tracing::instrument(skip(state, request_id, action))]
pub async fn post_connection_message(
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(action): ValidatedJson<ClientAction>,
) -> Result<impl IntoResponse, HttpAppError> {
    dispatch_action(&state, &connection_id, &request_id.0, action).await?;
    Ok((StatusCode::OK, "OK"))
}
