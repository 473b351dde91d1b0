use crate::clock::{parse_clock, NOON};
use crate::types::{Session, Speaker};

/// ISO day codes accepted by the date filter, mapped to the label fragment
/// they stand for.
pub const DATE_CODES: &[(&str, &str)] = &[("2025-11-25", "Nov 25"), ("2025-11-26", "Nov 26")];

/// Start clock assumed for sessions without one, per time-of-day bucket.
const MORNING_MISSING_START: &str = "12:00 PM";
const AFTERNOON_MISSING_START: &str = "0:00 AM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
}

impl TimeOfDay {
    /// Case-insensitive; unrecognized values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "morning" => Some(TimeOfDay::Morning),
            "afternoon" => Some(TimeOfDay::Afternoon),
            _ => None,
        }
    }

    pub fn matches(self, start_time: Option<&str>) -> bool {
        match self {
            TimeOfDay::Morning => parse_clock(start_time.unwrap_or(MORNING_MISSING_START)) < NOON,
            TimeOfDay::Afternoon => {
                parse_clock(start_time.unwrap_or(AFTERNOON_MISSING_START)) >= NOON
            }
        }
    }
}

/// Filter parameters for listing sessions.
///
/// Filters are applied in the order date, stage, time of day, search. Empty
/// values are ignored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionFilter {
    pub date: Option<String>,
    pub stage: Option<String>,
    pub time: Option<String>,
    pub search: Option<String>,
}

impl SessionFilter {
    /// Keep the sessions matching every set filter, in input order.
    pub fn apply<'a, S: AsRef<Session>>(&self, sessions: &'a [S]) -> Vec<&'a S> {
        let mut filtered: Vec<&S> = sessions.iter().collect();

        if let Some(date) = non_empty(&self.date) {
            filtered.retain(|s| matches_date(session_of(*s), date));
        }

        if let Some(stage) = non_empty(&self.stage) {
            let stage = stage.to_lowercase();
            filtered.retain(|s| session_of(*s).stage.to_lowercase().contains(&stage));
        }

        if let Some(time_of_day) = non_empty(&self.time).and_then(TimeOfDay::parse) {
            filtered.retain(|s| time_of_day.matches(session_of(*s).start_time.as_deref()));
        }

        if let Some(search) = non_empty(&self.search) {
            let search = search.to_lowercase();
            filtered.retain(|s| session_matches_search(session_of(*s), &search));
        }

        filtered
    }
}

/// Filter parameters for listing speakers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpeakerFilter {
    pub search: Option<String>,
}

impl SpeakerFilter {
    pub fn apply<'a>(&self, speakers: &'a [Speaker]) -> Vec<&'a Speaker> {
        match non_empty(&self.search) {
            Some(search) => {
                let search = search.to_lowercase();
                speakers
                    .iter()
                    .filter(|sp| {
                        contains_lower(&sp.name, &search)
                            || contains_lower(&sp.company, &search)
                            || contains_lower(&sp.title, &search)
                            || contains_lower(&sp.role, &search)
                    })
                    .collect()
            }
            None => speakers.iter().collect(),
        }
    }
}

/// Literal substring of the date label, or a known day code whose fragment
/// the label contains.
pub fn matches_date(session: &Session, filter: &str) -> bool {
    if session.date.contains(filter) {
        return true;
    }

    DATE_CODES
        .iter()
        .any(|(code, fragment)| *code == filter && session.date.contains(fragment))
}

/// `search` must already be lowercase.
fn session_matches_search(session: &Session, search: &str) -> bool {
    contains_lower(&session.title, search)
        || session.speakers.iter().any(|sp| {
            contains_lower(&sp.name, search)
                || contains_lower(&sp.company, search)
                || contains_lower(&sp.title, search)
                || contains_lower(&sp.role, search)
        })
        || session
            .ecosystems
            .iter()
            .any(|tag| contains_lower(tag, search))
}

fn session_of<S: AsRef<Session>>(item: &S) -> &Session {
    item.as_ref()
}

fn contains_lower(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
