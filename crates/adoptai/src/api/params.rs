use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde_json::{Map, Value};

use adoptai_schedule::{SessionFilter, SpeakerFilter};

/// Query string reduced to the first non-empty value of each parameter.
///
/// An undecodable query string yields an empty set rather than a rejection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut params: Vec<(String, String)> = Vec::new();
        for (name, value) in pairs {
            if value.is_empty() || params.iter().any(|(seen, _)| *seen == name) {
                continue;
            }
            params.push((name, value));
        }
        Self(params)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// `true`, `1` or `yes`, case-insensitive.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
    }

    /// Every supplied parameter, recognized or not.
    pub fn echo(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect()
    }

    pub fn session_filter(&self) -> SessionFilter {
        SessionFilter {
            date: self.owned("date"),
            stage: self.owned("stage"),
            time: self.owned("time"),
            search: self.owned("search"),
        }
    }

    pub fn speaker_filter(&self) -> SpeakerFilter {
        SpeakerFilter {
            search: self.owned("search"),
        }
    }

    fn owned(&self, name: &str) -> Option<String> {
        self.get(name).map(String::from)
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();
        Ok(Self::from_pairs(pairs))
    }
}
