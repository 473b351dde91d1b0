use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Minutes since midnight at 12:00 PM.
pub const NOON: u32 = 720;

/// Civil timezone the event runs in.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Paris;

/// Session date labels look like "Nov 25, 2025".
const DATE_LABEL_FORMAT: &str = "%b %d, %Y";

/// Parse a loosely formatted clock label ("9:30 AM", "2 pm") into minutes
/// since midnight.
///
/// Labels without an AM/PM marker, or with non-numeric or out-of-range
/// components, resolve to `0`.
pub fn parse_clock(text: &str) -> u32 {
    parse_clock_strict(text).unwrap_or(0)
}

/// Combine a date label and a clock label into an instant in `tz`.
///
/// Returns `None` if either label is malformed, or if the local time falls
/// inside a DST gap. Ambiguous local times resolve to the earlier instant.
pub fn parse_instant(date_label: &str, clock_text: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let date = NaiveDate::parse_from_str(date_label.trim(), DATE_LABEL_FORMAT).ok()?;
    let minutes = parse_clock_strict(clock_text)?;
    let time = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)?;
    tz.from_local_datetime(&date.and_time(time)).earliest()
}

fn parse_clock_strict(text: &str) -> Option<u32> {
    let normalized = text.trim().to_uppercase();
    let pm = normalized.contains("PM");
    if !pm && !normalized.contains("AM") {
        return None;
    }

    let digits = normalized.replace("AM", "").replace("PM", "");
    let mut parts = digits.trim().split(':');

    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(m) => m.trim().parse().ok()?,
        None => 0,
    };

    if hour > 12 || minute > 59 {
        return None;
    }

    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };

    Some(hour * 60 + minute)
}

/// Source of the current instant for now-window queries.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new<T: TimeZone>(instant: DateTime<T>) -> Self {
        Self(instant.with_timezone(&Utc))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
