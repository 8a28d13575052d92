use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Everything a request handler can fail with. None of these are fatal to
/// the process; each maps to a status code and a JSON error body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unrecognized task kind: {0}")]
    InvalidTaskKind(String),

    #[error("failed to reach agent endpoint: {0}")]
    DispatchFailed(String),

    #[error("no request with id {0}")]
    UnknownRequest(String),

    #[error("request {0} already reached a terminal status")]
    AlreadyCompleted(String),

    #[error("signature verification failed")]
    BadSignature,

    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidTaskKind(_) => StatusCode::BAD_REQUEST,
            ApiError::DispatchFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::UnknownRequest(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyCompleted(_) => StatusCode::CONFLICT,
            ApiError::BadSignature => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
