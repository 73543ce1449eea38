//! Weekly schedule: when the next board game night starts.
//!
//! The event recurs every Tuesday at 18:45 local time. Occurrences are never
//! stored; they are recomputed from the current time on every request.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Local, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;

use crate::error::ConfigError;

/// Day of the week the event takes place.
pub const TARGET_WEEKDAY: Weekday = Weekday::Tue;

/// Wall-clock hour the event starts.
pub const TARGET_HOUR: u32 = 18;

/// Wall-clock minute the event starts.
pub const TARGET_MINUTE: u32 = 45;

/// How long after its start the event counts as "in progress" (5h14m).
pub fn status_window() -> TimeDelta {
    TimeDelta::hours(5) + TimeDelta::minutes(14)
}

/// Compute the occurrence for the calendar day of `t` or the first Tuesday after it.
///
/// The result is in the same timezone as `t`. When `t` is already a Tuesday the
/// result is that day's 18:45, even if `t` is past it; callers decide whether
/// that means the event is underway or over.
pub fn next_occurrence<Z: TimeZone>(t: &DateTime<Z>) -> DateTime<Z> {
    let start = t.date_naive();
    let date = start
        .iter_days()
        .take(7)
        .find(|day| day.weekday() == TARGET_WEEKDAY)
        .expect("every 7-day span contains a Tuesday");

    let naive = date
        .and_hms_opt(TARGET_HOUR, TARGET_MINUTE, 0)
        .expect("18:45:00 is a valid time of day");

    resolve_local(&t.timezone(), naive)
}

/// Map a wall-clock time to an instant in `tz`.
///
/// Ambiguous times (clocks going back) take the earlier instant. Times inside
/// a gap (clocks going forward) are moved one hour later.
pub(crate) fn resolve_local<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> DateTime<Z> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

/// Source of the current instant.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Timezone the schedule is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventZone {
    /// An IANA zone such as `Europe/Amsterdam`.
    Named(Tz),
    /// Whatever zone the host is configured with, when it has no IANA name.
    /// Renders as a numeric offset.
    Local,
}

impl EventZone {
    /// Parse a zone identifier.
    ///
    /// An empty string or `UTC` selects UTC and `Local` selects the host zone.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "" | "UTC" => Ok(Self::Named(chrono_tz::UTC)),
            "Local" => Ok(Self::host()),
            other => other
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|_| ConfigError::InvalidLocation(other.to_string())),
        }
    }

    /// The host zone, by IANA name when one can be found.
    ///
    /// Looks at `TZ`, then at the `/etc/localtime` link target.
    pub fn host() -> Self {
        std::env::var("TZ")
            .ok()
            .and_then(|tz| zone_from_host_name(&tz))
            .or_else(|| {
                std::fs::read_link("/etc/localtime")
                    .ok()
                    .and_then(|path| path.to_str().and_then(zone_from_host_name))
            })
            .map(Self::Named)
            .unwrap_or(Self::Local)
    }
}

/// Accepts `Europe/Amsterdam`, `:Europe/Amsterdam` or a path ending in `zoneinfo/Europe/Amsterdam`.
fn zone_from_host_name(name: &str) -> Option<Tz> {
    let name = name.trim_start_matches(':');
    let name = name.rsplit_once("zoneinfo/").map_or(name, |(_, zone)| zone);
    name.parse().ok()
}

impl FromStr for EventZone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EventZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(tz) => write!(f, "{}", tz.name()),
            Self::Local => write!(f, "Local ({})", Local::now().offset()),
        }
    }
}
