use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::types::ScheduledSession;

/// How far ahead, in minutes, a session counts as upcoming.
pub const UPCOMING_WINDOW_MINUTES: i64 = 30;

/// Assumed length in minutes of a session whose end is missing or not after
/// its start.
pub const DEFAULT_SESSION_MINUTES: i64 = 20;

/// Sessions in progress and sessions about to start, relative to one instant.
#[derive(Debug, Default)]
pub struct NowWindow<'a> {
    pub ongoing: Vec<&'a ScheduledSession>,
    pub upcoming: Vec<&'a ScheduledSession>,
}

impl ScheduledSession {
    /// End instant used by the now-window: the parsed end if it is after the
    /// start, otherwise start plus [`DEFAULT_SESSION_MINUTES`].
    pub fn effective_end(&self) -> Option<DateTime<Tz>> {
        let start = self.start()?;
        match self.end() {
            Some(end) if end > start => Some(end),
            _ => Some(start + TimeDelta::minutes(DEFAULT_SESSION_MINUTES)),
        }
    }
}

/// Split sessions into ongoing (`start <= now <= end`) and upcoming
/// (`now < start <= now + 30min`). Sessions without a start instant are
/// skipped. Input order is kept within each bucket.
pub fn partition_by_now(sessions: &[ScheduledSession], now: DateTime<Utc>) -> NowWindow<'_> {
    let horizon = now + TimeDelta::minutes(UPCOMING_WINDOW_MINUTES);
    let mut window = NowWindow::default();

    for scheduled in sessions {
        let (Some(start), Some(end)) = (scheduled.start(), scheduled.effective_end()) else {
            continue;
        };
        let start = start.with_timezone(&Utc);
        let end = end.with_timezone(&Utc);

        if start <= now && now <= end {
            window.ongoing.push(scheduled);
        } else if start > now && start <= horizon {
            window.upcoming.push(scheduled);
        }
    }

    window
}
