use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::clock::parse_instant;

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A speaker as embedded in a session record.
///
/// Fields other than the ones searched are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSpeaker {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A session as stored in `sessions.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Free-form date label, e.g. "Nov 25, 2025".
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    /// Free-form clock label, e.g. "9:30 AM". `None` when absent or null.
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speakers: Vec<SessionSpeaker>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ecosystems: Vec<String>,
}

impl Session {
    /// Combined "<start> - <end>" label, trimmed when one side is missing.
    pub fn time_label(&self) -> String {
        let start = self.start_time.as_deref().unwrap_or("");
        let end = self.end_time.as_deref().unwrap_or("");
        if start.is_empty() && end.is_empty() {
            return String::new();
        }

        format!("{} - {}", start, end)
            .trim_matches(|c| c == ' ' || c == '-')
            .to_string()
    }

    /// The public representation of this session.
    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            id: &self.id,
            title: &self.title,
            date: &self.date,
            time: self.time_label(),
            stage: &self.stage,
            speakers: &self.speakers,
            ecosystems: &self.ecosystems,
        }
    }
}

impl AsRef<Session> for Session {
    fn as_ref(&self) -> &Session {
        self
    }
}

/// Serialized shape of a session in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub date: &'a str,
    pub time: String,
    pub stage: &'a str,
    pub speakers: &'a [SessionSpeaker],
    pub ecosystems: &'a [String],
}

/// A speaker as stored in `speakers.json`.
///
/// The dataset stores the job title under `title`; some records use `role`
/// instead, or carry both. Unknown fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub role: String,
    /// Identifiers of the sessions this speaker appears in.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Top-level shape of `sessions.json`. `metadata` is ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SessionsFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: Vec<Session>,
}

/// Top-level shape of `speakers.json`. `metadata` is ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SpeakersFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub speakers: Vec<Speaker>,
}

/// A session enriched with its parsed start and end instants.
///
/// The instants are computed once when the dataset is loaded and are never
/// serialized.
#[derive(Debug, Clone)]
pub struct ScheduledSession {
    session: Session,
    start: Option<DateTime<Tz>>,
    end: Option<DateTime<Tz>>,
}

impl ScheduledSession {
    pub fn new(session: Session, tz: Tz) -> Self {
        let start = session
            .start_time
            .as_deref()
            .and_then(|t| parse_instant(&session.date, t, tz));
        let end = session
            .end_time
            .as_deref()
            .and_then(|t| parse_instant(&session.date, t, tz));

        Self {
            session,
            start,
            end,
        }
    }

    /// Build from already computed instants.
    pub fn from_parts(
        session: Session,
        start: Option<DateTime<Tz>>,
        end: Option<DateTime<Tz>>,
    ) -> Self {
        Self {
            session,
            start,
            end,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn start(&self) -> Option<DateTime<Tz>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Tz>> {
        self.end
    }
}

impl AsRef<Session> for ScheduledSession {
    fn as_ref(&self) -> &Session {
        &self.session
    }
}
