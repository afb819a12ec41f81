//! Wire-format export of result records (the reverse path).

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use routing::LabInfo;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Export request: which results to serialize, and optionally whose lab
/// header to stamp on the export. Access filtering of the result ids is the
/// caller's responsibility.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub result_ids: Vec<String>,
    #[serde(default)]
    pub lab: Option<LabInfo>,
}

/// Serialize the requested results back into the line-record wire format.
pub async fn export_results(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<ExportRequest>,
) -> ServerResult<Response> {
    if request.result_ids.is_empty() {
        return Err(ServerError::BadRequest("no result ids supplied".to_string()));
    }

    let mut results = Vec::with_capacity(request.result_ids.len());
    for result_id in &request.result_ids {
        match state.repository.get(result_id) {
            Some(result) => results.push(result),
            None => return Err(ServerError::Routing(routing::RoutingError::ResultNotFound(
                result_id.clone(),
            ))),
        }
    }

    let lab = request.lab.unwrap_or_else(|| state.config.lab.clone());
    let wire_text = routing::generate_ldt(&results, &lab);

    info!(results = results.len(), "export generated");
    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        wire_text,
    )
        .into_response())
}
