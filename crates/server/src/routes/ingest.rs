//! The signed-delivery ingestion endpoint.
//!
//! `POST /ingest` runs the full pipeline for one delivery: gate checks →
//! raw-message persistence → record parsing → identifier extraction →
//! recipient matching → result creation. One accepted message produces
//! exactly one result, assigned when the code pair matches a recipient and
//! queued for review otherwise.

use crate::error::{ServerError, ServerResult};
use crate::gate;
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Success response for an accepted delivery
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message_id: String,
    pub result_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Number of structurally valid records in the message
    pub records: usize,
}

/// Ingest one signed delivery.
pub async fn ingest_message(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Response> {
    // Media-type screening first; everything else assumes a readable body.
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let is_json = gate::is_json_media_type(&content_type);
    if !is_json && !gate::is_text_media_type(&content_type) {
        return Err(ServerError::UnsupportedMediaType(content_type));
    }

    // Delivery authentication.
    let timestamp = require_header(&headers, gate::HEADER_TIMESTAMP)?;
    let signature = require_header(&headers, gate::HEADER_SIGNATURE)?;
    gate::verify_signature(
        state.config.webhook_secret.as_bytes(),
        &timestamp,
        &body,
        &signature,
    )?;
    gate::check_timestamp(
        &timestamp,
        chrono::Utc::now().timestamp_millis(),
        state.config.timestamp_tolerance(),
    )?;

    // Per-source rate limit.
    let source = gate::source_key(&headers);
    if !state.check_rate_limit(&source) {
        metrics::counter!("ldtflow_ingest_rate_limited_total").increment(1);
        return Err(ServerError::RateLimitExceeded);
    }

    if body.is_empty() {
        return Err(ServerError::BadRequest("empty payload".to_string()));
    }

    // Replay dedup: idempotent fast path, not an error.
    let body_hash = gate::sha256_hex(&body);
    let idempotency_key = headers
        .get(gate::HEADER_IDEMPOTENCY_KEY)
        .and_then(|v| v.to_str().ok());
    let replay_key = gate::replay_key(idempotency_key, &timestamp, &body_hash);
    if !state
        .replay_cache
        .insert_if_absent(&replay_key, state.config.replay_ttl())
    {
        info!(content_hash = %body_hash, "duplicate delivery ignored");
        metrics::counter!("ldtflow_ingest_duplicate_total").increment(1);
        return Ok((StatusCode::OK, Json(json!({"message": "duplicate ignored"}))).into_response());
    }

    // The delivery is validated. Run the pipeline on a spawned task so a
    // client disconnect cannot drop a validated message mid-write.
    let pipeline_state = state.clone();
    let outcome = tokio::spawn(async move {
        process_validated(pipeline_state, body, is_json, body_hash)
    })
    .await
    .map_err(|err| ServerError::Internal(format!("pipeline task failed: {err}")))??;

    Ok((StatusCode::ACCEPTED, Json(outcome)).into_response())
}

/// Everything past the gate: persist, parse, extract, match, create.
fn process_validated(
    state: Arc<ServerState>,
    body: Bytes,
    is_json: bool,
    content_hash: String,
) -> ServerResult<IngestResponse> {
    // Raw bytes go to the append-only store before anything can still fail;
    // an accepted delivery is never lost, even when it parses to nothing.
    let raw_message = state.raw_store.persist(&body);

    let text = ldt::unwrap_payload(&body, is_json);
    let records = ldt::parse_message(&text, &state.config.parser);
    if records.is_empty() {
        warn!(
            message_id = %raw_message.id,
            content_hash = %content_hash,
            "message yielded zero valid records"
        );
        metrics::counter!("ldtflow_ingest_unparsable_total").increment(1);
        return Err(ServerError::UnparsableMessage);
    }

    let identifiers = extract::extract_identifiers(&records);
    let test_type = extract::detect_test_type(&records)
        .unwrap_or_else(|| "Laboratory Result".to_string());

    let routed = routing::build_result(
        &identifiers,
        &raw_message.id,
        &test_type,
        state.directory.as_ref(),
        state.repository.as_ref(),
    )?;

    metrics::counter!("ldtflow_ingest_accepted_total").increment(1);
    if !routed.assigned {
        metrics::counter!("ldtflow_ingest_unassigned_total").increment(1);
    }
    info!(
        message_id = %raw_message.id,
        result_id = %routed.result_id,
        content_hash = %content_hash,
        records = records.len(),
        assigned = routed.assigned,
        "message ingested"
    );

    Ok(IngestResponse {
        message_id: raw_message.id,
        result_id: routed.result_id,
        assigned_to: routed.assigned_recipient_id,
        records: records.len(),
    })
}

fn require_header(headers: &HeaderMap, name: &str) -> ServerResult<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ServerError::Authentication(format!("missing {name} header")))
}
