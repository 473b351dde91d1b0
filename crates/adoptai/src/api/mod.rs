mod docs;
mod params;
mod response;
mod sessions;
mod speakers;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::handler::Handler;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    AUTHORIZATION, CONTENT_TYPE,
};
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::Router;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use adoptai_schedule::{Clock, ScheduleCache};

use response::JsonBody;

pub const AVAILABLE_ENDPOINTS: &[&str] = &["/", "/llms.txt", "/sessions", "/speakers", "/health"];

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ScheduleCache>,
    pub clock: Arc<dyn Clock>,
    pub service_name: Arc<str>,
}

impl AppState {
    pub fn new(cache: ScheduleCache, clock: Arc<dyn Clock>, service_name: &str) -> Self {
        Self {
            cache: Arc::new(cache),
            clock,
            service_name: Arc::from(service_name),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/", endpoint(docs::llms_txt))
        .route("/llms.txt", endpoint(docs::llms_txt))
        .route("/robots.txt", endpoint(docs::robots_txt))
        .route("/health", endpoint(docs::health))
        .route("/sessions", endpoint(sessions::list_sessions))
        .route("/speakers", endpoint(speakers::list_speakers))
        .fallback(not_found)
        .layer(cors)
        .layer(middleware::map_response(stamp_cors_headers))
        .with_state(state)
}

/// OPTIONS answers 200 with an empty body; every other method is served by
/// `handler`.
fn endpoint<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    get(handler.clone()).options(preflight).fallback(handler)
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn not_found(method: Method, uri: Uri) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    debug!(%method, path = uri.path(), "No route");
    let body = json!({
        "error": "Not Found",
        "message": format!("Path {} not found", uri.path()),
        "available_endpoints": AVAILABLE_ENDPOINTS,
    });
    (StatusCode::NOT_FOUND, JsonBody(body)).into_response()
}

/// Every response carries the same CORS headers, whether or not the request
/// sent an `Origin`.
async fn stamp_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}
