use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use tracing::info;

use super::super::AppState;
use crate::core::signature;
use crate::core::store::types::CallbackOutcome;
use crate::error::ApiError;

/// Body of a completion callback. `request_id` is optional here because the
/// exam and chat routes carry it in the path instead.
#[derive(Deserialize)]
pub struct CompletionPayload {
    #[serde(default)]
    pub request_id: Option<String>,
    pub outcome: CallbackOutcome,
    #[serde(default)]
    pub result: String,
}

/// Callback for exam generation; id in the path.
pub async fn exam_webhook_endpoint(
    Path(request_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    verify_signature(&state, &headers, &body)?;
    let payload = parse_payload(&body)?;
    apply_completion(&state, &request_id, payload).await
}

/// Callback for chat; id in the path.
pub async fn ai_webhook_endpoint(
    Path(request_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    verify_signature(&state, &headers, &body)?;
    let payload = parse_payload(&body)?;
    apply_completion(&state, &request_id, payload).await
}

/// Callback for grading; id in the body.
pub async fn grading_webhook_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    verify_signature(&state, &headers, &body)?;
    let payload = parse_payload(&body)?;
    let request_id = payload
        .request_id
        .clone()
        .ok_or_else(|| ApiError::BadRequest("grading callback is missing request_id".into()))?;
    apply_completion(&state, &request_id, payload).await
}

fn parse_payload(body: &str) -> Result<CompletionPayload, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Raw-body HMAC check. Active only when a secret is configured; otherwise
/// the webhook boundary is trusted-network-only.
fn verify_signature(state: &AppState, headers: &HeaderMap, body: &str) -> Result<(), ApiError> {
    if state.webhook_secret.is_empty() {
        return Ok(());
    }
    let sig = headers
        .get("x-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::BadSignature)?;
    if signature::verify(&state.webhook_secret, body, sig) {
        Ok(())
    } else {
        Err(ApiError::BadSignature)
    }
}

async fn apply_completion(
    state: &AppState,
    request_id: &str,
    payload: CompletionPayload,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = state
        .store
        .complete_request(request_id, payload.outcome, &payload.result)
        .await?;

    info!(
        "Request {} moved to {} via webhook",
        req.request_id,
        req.status.as_str()
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "request_id": req.request_id,
        "status": req.status,
    })))
}
