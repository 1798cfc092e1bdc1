use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failures of a single question cycle. None of these are fatal: the
/// controller surfaces them and the session stays usable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("question is empty")]
    InputEmpty,
    #[error("question is longer than {max} characters")]
    InputTooLong { max: usize },
    #[error("review search is unavailable: {0}")]
    RetrievalUnavailable(String),
    #[error("answer generation failed: {0}")]
    GenerationFailed(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::InputEmpty | ChatError::InputTooLong { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::RetrievalUnavailable(_) => ApiError::ServiceUnavailable(err.to_string()),
            ChatError::GenerationFailed(_) => ApiError::BadGateway(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
