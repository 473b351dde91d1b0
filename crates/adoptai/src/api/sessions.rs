use axum::extract::State;
use axum::response::{IntoResponse, Response};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use adoptai_schedule::{partition_by_now, ScheduledSession, SessionView};

use super::params::QueryParams;
use super::response::{ApiError, JsonBody};
use super::AppState;

#[derive(Serialize)]
struct SessionList<'a> {
    total: usize,
    count: usize,
    filters: Map<String, Value>,
    sessions: Vec<SessionView<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NowResponse<'a> {
    current_time: String,
    timezone: &'static str,
    ongoing: Bucket<'a>,
    upcoming: Bucket<'a>,
}

#[derive(Serialize)]
struct Bucket<'a> {
    description: &'static str,
    count: usize,
    sessions: Vec<SessionView<'a>>,
}

impl<'a> Bucket<'a> {
    fn new(description: &'static str, sessions: &[&'a ScheduledSession]) -> Self {
        Self {
            description,
            count: sessions.len(),
            sessions: views(sessions),
        }
    }
}

/// `GET /sessions`: filtered listing, or the now-window when `now` is truthy.
pub async fn list_sessions(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Response, ApiError> {
    let sessions = state.cache.sessions().await?;

    if params.is_truthy("now") {
        let tz = state.cache.timezone();
        let now = state.clock.now();
        let window = partition_by_now(sessions.as_slice(), now);
        debug!(
            ongoing = window.ongoing.len(),
            upcoming = window.upcoming.len(),
            "Now-window"
        );

        let body = NowResponse {
            current_time: format_current_time(now.with_timezone(&tz)),
            timezone: tz.name(),
            ongoing: Bucket::new("Sessions currently in progress", &window.ongoing),
            upcoming: Bucket::new("Sessions starting within 30 minutes", &window.upcoming),
        };
        return Ok(JsonBody(body).into_response());
    }

    let matched = params.session_filter().apply(sessions.as_slice());
    debug!(total = sessions.len(), count = matched.len(), "Listed sessions");

    let body = SessionList {
        total: sessions.len(),
        count: matched.len(),
        filters: params.echo(),
        sessions: views(&matched),
    };
    Ok(JsonBody(body).into_response())
}

fn views<'a>(sessions: &[&'a ScheduledSession]) -> Vec<SessionView<'a>> {
    sessions.iter().map(|s| s.session().view()).collect()
}

/// e.g. "2025-11-25 09:45 CET"
fn format_current_time(now: chrono::DateTime<Tz>) -> String {
    now.format("%Y-%m-%d %H:%M %Z").to_string()
}
