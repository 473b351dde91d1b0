use axum::extract::State;
use axum::response::Response;
use serde_json::json;

use super::response::{plain_text, JsonBody};
use super::AppState;

const ROBOTS_TXT: &str = "User-agent: *\nAllow: /\n";

/// `GET /` and `GET /llms.txt`. Never fails; serves a placeholder when the
/// document cannot be fetched.
pub async fn llms_txt(State(state): State<AppState>) -> Response {
    let text = state.cache.fallback_text().await;
    plain_text(text.to_string())
}

pub async fn robots_txt() -> Response {
    plain_text(ROBOTS_TXT)
}

pub async fn health(State(state): State<AppState>) -> JsonBody<serde_json::Value> {
    JsonBody(json!({
        "status": "healthy",
        "service": &*state.service_name,
    }))
}
