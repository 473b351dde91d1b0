use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::debug;

use adoptai_schedule::Speaker;

use super::params::QueryParams;
use super::response::{ApiError, JsonBody};
use super::AppState;

#[derive(Serialize)]
struct SpeakerList<'a> {
    count: usize,
    speakers: Vec<&'a Speaker>,
}

pub async fn list_speakers(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Response, ApiError> {
    let speakers = state.cache.speakers().await?;
    let matched = params.speaker_filter().apply(speakers.as_slice());
    debug!(total = speakers.len(), count = matched.len(), "Listed speakers");

    let body = SpeakerList {
        count: matched.len(),
        speakers: matched,
    };
    Ok(JsonBody(body).into_response())
}
