use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = state.sessions.create().await;
    Ok((StatusCode::CREATED, Json(json!({ "id": session_id }))))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = state.sessions.acquire(&session_id).await?;
    Ok(Json(json!({
        "id": session_id,
        "state": controller.state().to_string(),
        "turns": controller.transcript()
    })))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut controller = state.sessions.acquire(&session_id).await?;
    match controller.ask(&payload.question).await {
        Ok(turn) => Ok(Json(json!({ "turn": turn }))),
        Err(err) => {
            tracing::warn!("Session {}: question failed: {}", session_id, err);
            Err(err.into())
        }
    }
}

pub async fn clear_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let mut controller = state.sessions.acquire(&session_id).await?;
    controller.clear();
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.sessions.remove(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session {} not found", session_id)))
    }
}
