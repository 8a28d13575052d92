use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use super::super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub session_id: String,
    pub message: String,
}

pub async fn send_message_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request_id = state
        .dispatcher
        .submit("chat", &payload.session_id, &payload.message)
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "request_id": request_id }),
    ))
}

/// Everything besides `requester` is the exam spec (topics, course, question
/// counts). The website owns that shape; we pass it through opaque.
#[derive(Deserialize)]
pub struct RequestExamRequest {
    #[serde(default)]
    pub requester: String,
    #[serde(flatten)]
    pub spec: serde_json::Value,
}

pub async fn request_exam_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<RequestExamRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request_id = state
        .dispatcher
        .submit(
            "exam-generation",
            &payload.requester,
            &payload.spec.to_string(),
        )
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "request_id": request_id }),
    ))
}

#[derive(Deserialize)]
pub struct SubmitExamRequest {
    #[serde(default)]
    pub requester: String,
    #[serde(flatten)]
    pub submission: serde_json::Value,
}

pub async fn submit_exam_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request_id = state
        .dispatcher
        .submit(
            "grading",
            &payload.requester,
            &payload.submission.to_string(),
        )
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "request_id": request_id }),
    ))
}

/// Poll endpoint: the UI re-renders once the webhook completion lands.
pub async fn request_status_endpoint(
    Path(request_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.store.get_request(&request_id).await? {
        Some(req) => Ok(Json(serde_json::json!({ "success": true, "request": req }))),
        None => Err(ApiError::UnknownRequest(request_id)),
    }
}

pub async fn health_endpoint() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "fyssa-web" }))
}
