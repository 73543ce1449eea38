//! Event status derived from the clock, the schedule and the cancellation flag.

use std::fmt;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use strum::{Display, IntoStaticStr};

use crate::schedule::{next_occurrence, status_window, EventZone};

/// Go's RFC 850 layout: `Monday, 02-Jan-06 15:04:05 MST`.
const RFC850: &str = "%A, %d-%b-%y %H:%M:%S %Z";

const CANCELLED_TEXT: &str = "Board game night has been cancelled :(";
const IN_PROGRESS_TEXT: &str = "It is board game night!";

/// Coarse status label, used for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    /// The flag is set.
    Cancelled,
    /// Inside the status window.
    InProgress,
    /// Still to come.
    Upcoming,
}

/// Time left until an occurrence, split into whole units.
///
/// Each component is a truncated quotient/remainder of the total number of
/// seconds, so every component carries the sign of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    /// Whole days.
    pub days: i64,
    /// Hours within the day.
    pub hours: i64,
    /// Minutes within the hour.
    pub minutes: i64,
    /// Seconds within the minute.
    pub seconds: i64,
}

impl Remaining {
    /// Split a duration into days, hours, minutes and seconds.
    pub fn from_delta(delta: TimeDelta) -> Self {
        let total = delta.num_seconds();
        Self {
            days: total / 86_400,
            hours: (total / 3_600) % 24,
            minutes: (total / 60) % 60,
            seconds: total % 60,
        }
    }
}

/// What the status page reports.
#[derive(Debug, Clone, PartialEq)]
pub enum EventStatus<Z: TimeZone> {
    /// Cancelled, whatever the time.
    Cancelled,
    /// Started less than one status window ago.
    InProgress,
    /// Not started yet (or the same-day occurrence already ended).
    Upcoming {
        /// Start of the occurrence.
        at: DateTime<Z>,
        /// Time left until `at`.
        remaining: Remaining,
    },
}

impl<Z: TimeZone> EventStatus<Z> {
    /// Label for this status.
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Cancelled => StatusKind::Cancelled,
            Self::InProgress => StatusKind::InProgress,
            Self::Upcoming { .. } => StatusKind::Upcoming,
        }
    }
}

impl<Z: TimeZone> fmt::Display for EventStatus<Z>
where
    Z::Offset: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str(CANCELLED_TEXT),
            Self::InProgress => f.write_str(IN_PROGRESS_TEXT),
            Self::Upcoming { at, remaining } => {
                writeln!(f, "The next board game night is on {}", at.format(RFC850))?;
                writeln!(
                    f,
                    "That is in {} days, {} hours, {} minutes, and {} seconds",
                    remaining.days, remaining.hours, remaining.minutes, remaining.seconds
                )
            }
        }
    }
}

/// Decide the status for `now` given the occurrence `next`.
///
/// The in-progress window is half-open: `[next, next + window)`.
pub fn evaluate<Z: TimeZone>(
    now: &DateTime<Z>,
    next: DateTime<Z>,
    window: TimeDelta,
    cancelled: bool,
) -> EventStatus<Z> {
    if cancelled {
        return EventStatus::Cancelled;
    }

    if next <= *now && *now < next.clone() + window {
        return EventStatus::InProgress;
    }

    let remaining = Remaining::from_delta(next.clone().signed_duration_since(now.clone()));
    EventStatus::Upcoming {
        at: next,
        remaining,
    }
}

/// Status for `now`, computing the occurrence in `now`'s own zone.
pub fn status_at<Z: TimeZone>(now: &DateTime<Z>, cancelled: bool) -> EventStatus<Z> {
    evaluate(now, next_occurrence(now), status_window(), cancelled)
}

/// Rendered status page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Status label.
    pub kind: StatusKind,
    /// Plain-text body.
    pub text: String,
}

impl StatusReport {
    fn from_status<Z: TimeZone>(status: EventStatus<Z>) -> Self
    where
        Z::Offset: fmt::Display,
    {
        Self {
            kind: status.kind(),
            text: status.to_string(),
        }
    }
}

/// Build the status page for the instant `now`, viewed from `zone`.
pub fn report(zone: EventZone, now: DateTime<Utc>, cancelled: bool) -> StatusReport {
    match zone {
        EventZone::Named(tz) => StatusReport::from_status(status_at(&now.with_timezone(&tz), cancelled)),
        EventZone::Local => StatusReport::from_status(status_at(&now.with_timezone(&Local), cancelled)),
    }
}
