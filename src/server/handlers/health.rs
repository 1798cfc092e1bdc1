use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let indexed_reviews = match state.store.count().await {
        Ok(count) => Some(count),
        Err(err) => {
            tracing::warn!("Failed to count indexed reviews: {}", err);
            None
        }
    };

    let reachable = match state.provider.health_check().await {
        Ok(ok) => ok,
        Err(err) => {
            tracing::debug!("LLM health check failed: {}", err);
            false
        }
    };

    Json(json!({
        "status": "ok",
        "indexed_reviews": indexed_reviews,
        "llm": {
            "provider": state.provider.name(),
            "model": state.provider.model(),
            "embedding_model": state.provider.embedding_model(),
            "reachable": reachable
        },
        "sessions": state.sessions.len().await,
        "uptime_secs": (Utc::now() - state.started_at).num_seconds()
    }))
}
