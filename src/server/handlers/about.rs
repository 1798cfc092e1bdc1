use axum::response::IntoResponse;
use axum::Json;

use crate::about::about as about_content;

pub async fn about() -> impl IntoResponse {
    Json(about_content())
}
