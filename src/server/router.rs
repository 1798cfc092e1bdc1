use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{about, health, sessions};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// This function sets up:
/// - CORS middleware
/// - Health check and about endpoints
/// - Chat session endpoints
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/about", get(about::about))
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/:session_id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/api/sessions/:session_id/messages",
            post(sessions::ask).delete(sessions::clear_messages),
        )
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let allowed_origins = state
        .settings
        .server
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}
