//! Review-queue and admin reassignment endpoints.
//!
//! Reassignment is an explicit admin action, deliberately outside the
//! ingestion pipeline: the pipeline sets `assigned_recipient_id` once at
//! creation and never clears it.

use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Results awaiting manual routing, in creation order.
pub async fn list_unassigned(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let unassigned = state.repository.list_unassigned();
    Ok(Json(json!({
        "count": unassigned.len(),
        "results": unassigned,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub recipient_id: String,
}

/// Point a result at a recipient.
pub async fn reassign_result(
    State(state): State<Arc<ServerState>>,
    Path(result_id): Path<String>,
    Json(request): Json<ReassignRequest>,
) -> ServerResult<impl IntoResponse> {
    let updated = state
        .repository
        .reassign(&result_id, &request.recipient_id)?;
    Ok(Json(updated))
}
