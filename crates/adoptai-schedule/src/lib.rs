//! # adoptai-schedule
//!
//! Conference schedule datasets and the query logic that runs over them.
//!
//! ## Key Types
//!
//! - [`ScheduleCache`] - Lazily populated, process-lifetime dataset cache
//! - [`ObjectStore`] - Fetch-by-key backing store (S3, local directory, memory)
//! - [`SessionFilter`] / [`SpeakerFilter`] - Partial-match query filters
//! - [`NowWindow`] - Ongoing / upcoming partition relative to a given instant
//!
//! ## Time labels
//!
//! Session dates and clock times are stored as human-readable labels
//! ("Nov 25, 2025", "9:30 AM"). [`parse_clock`] and [`parse_instant`] turn
//! them into minutes-since-midnight and timezone-anchored instants; malformed
//! labels never raise, they resolve to `0` or `None`.

pub mod cache;
pub mod clock;
pub mod filter;
pub mod store;
pub mod types;
pub mod window;

pub use cache::{DatasetKeys, LoadError, ScheduleCache, FALLBACK_TEXT};
pub use clock::{
    parse_clock, parse_instant, Clock, FixedClock, SystemClock, DEFAULT_TIMEZONE, NOON,
};
pub use filter::{SessionFilter, SpeakerFilter, TimeOfDay};
pub use store::{LocalStore, MemoryStore, ObjectStore, S3Config, S3Store, StoreError};
pub use types::{ScheduledSession, Session, SessionSpeaker, SessionView, Speaker};
pub use window::{partition_by_now, NowWindow};
