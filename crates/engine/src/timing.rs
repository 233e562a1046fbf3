//! Derives a poll's lifecycle state and countdown from the wall clock.
//!
//! Everything here is a pure function of `now` so the presentation layer can
//! re-evaluate it on a fixed tick without accumulating drift. The server
//! re-validates every enforcement decision; these outputs are display hints.

use chrono::{DateTime, Duration, Utc};
use core::fmt::{self, Display};
use model::PollStatus;

/// Three-way partition of the timeline. The boundaries belong to the later
/// state: `now == start` is active, `now == end` is completed.
pub fn status(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> PollStatus {
    if now < start {
        PollStatus::Upcoming
    } else if now < end {
        PollStatus::Active
    } else {
        PollStatus::Completed
    }
}

/// The next boundary the countdown runs toward: the start while upcoming,
/// the end while active, nothing once completed.
pub fn boundary(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match status(now, start, end) {
        PollStatus::Upcoming => Some(start),
        PollStatus::Active => Some(end),
        PollStatus::Completed => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    None,
    Normal,
    Medium,
    High,
}

impl Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Normal => "normal",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// How soon the relevant boundary is: under an hour is high, under a day is
/// medium, anything further out is normal. Completed polls have none.
pub fn urgency(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> Urgency {
    let Some(boundary) = boundary(now, start, end) else {
        return Urgency::None;
    };
    let remaining = boundary - now;
    if remaining < Duration::hours(1) {
        Urgency::High
    } else if remaining < Duration::hours(24) {
        Urgency::Medium
    } else {
        Urgency::Normal
    }
}

/// Remaining time expressed as the largest applicable unit pair. Clamps to
/// [`Countdown::Ended`] once the boundary passes; never goes negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Ended,
    DaysHours { days: i64, hours: i64 },
    HoursMinutes { hours: i64, minutes: i64 },
    MinutesSeconds { minutes: i64, seconds: i64 },
}

pub fn countdown(now: DateTime<Utc>, boundary: DateTime<Utc>) -> Countdown {
    let remaining = boundary - now;
    if remaining <= Duration::zero() {
        return Countdown::Ended;
    }

    let secs = remaining.num_seconds();
    if secs >= 86_400 {
        Countdown::DaysHours { days: secs / 86_400, hours: secs % 86_400 / 3_600 }
    } else if secs >= 3_600 {
        Countdown::HoursMinutes { hours: secs / 3_600, minutes: secs % 3_600 / 60 }
    } else {
        Countdown::MinutesSeconds { minutes: secs / 60, seconds: secs % 60 }
    }
}

impl Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Ended => f.write_str("Ended"),
            Self::DaysHours { days, hours } => write!(f, "{days}d {hours}h"),
            Self::HoursMinutes { hours, minutes } => write!(f, "{hours}h {minutes}m"),
            Self::MinutesSeconds { minutes, seconds } => write!(f, "{minutes}m {seconds}s"),
        }
    }
}

/// One-call snapshot for the presentation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayState {
    pub status: PollStatus,
    pub urgency: Urgency,
    pub countdown: Countdown,
}

pub fn display(now: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> DisplayState {
    DisplayState {
        status: status(now, start, end),
        urgency: urgency(now, start, end),
        countdown: match boundary(now, start, end) {
            Some(boundary) => countdown(now, boundary),
            None => Countdown::Ended,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn status_partitions_the_timeline_without_gaps() {
        let (start, end) = (at(100), at(200));
        assert_eq!(status(at(0), start, end), PollStatus::Upcoming);
        assert_eq!(status(at(99), start, end), PollStatus::Upcoming);
        assert_eq!(status(at(100), start, end), PollStatus::Active);
        assert_eq!(status(at(199), start, end), PollStatus::Active);
        assert_eq!(status(at(200), start, end), PollStatus::Completed);
        assert_eq!(status(at(10_000), start, end), PollStatus::Completed);
    }

    #[test]
    fn urgency_tiers_track_the_relevant_boundary() {
        let hour = 3_600;
        let (start, end) = (at(30 * hour), at(60 * hour));

        // Upcoming: measured against the start.
        assert_eq!(urgency(at(0), start, end), Urgency::Normal);
        assert_eq!(urgency(at(6 * hour), start, end), Urgency::Normal);
        assert_eq!(urgency(at(7 * hour), start, end), Urgency::Medium);
        assert_eq!(urgency(at(29 * hour + 1), start, end), Urgency::High);

        // Active: measured against the end.
        assert_eq!(urgency(at(30 * hour), start, end), Urgency::Normal);
        assert_eq!(urgency(at(40 * hour), start, end), Urgency::Medium);
        assert_eq!(urgency(at(59 * hour + 30), start, end), Urgency::High);

        // Completed.
        assert_eq!(urgency(at(60 * hour), start, end), Urgency::None);
    }

    #[test]
    fn exact_tier_boundaries() {
        let (start, end) = (at(0), at(100 * 3_600));
        // Exactly 24 hours left is still normal, exactly 1 hour left is still medium.
        assert_eq!(urgency(at(76 * 3_600), start, end), Urgency::Normal);
        assert_eq!(urgency(at(76 * 3_600 + 1), start, end), Urgency::Medium);
        assert_eq!(urgency(at(99 * 3_600), start, end), Urgency::Medium);
        assert_eq!(urgency(at(99 * 3_600 + 1), start, end), Urgency::High);
    }

    #[test]
    fn countdown_picks_the_largest_unit_pair() {
        let boundary = at(0);
        let probe = |secs: i64| countdown(at(-secs), boundary);

        assert_eq!(probe(2 * 86_400 + 5 * 3_600 + 59), Countdown::DaysHours { days: 2, hours: 5 });
        assert_eq!(probe(86_400), Countdown::DaysHours { days: 1, hours: 0 });
        assert_eq!(probe(86_399), Countdown::HoursMinutes { hours: 23, minutes: 59 });
        assert_eq!(probe(3_600), Countdown::HoursMinutes { hours: 1, minutes: 0 });
        assert_eq!(probe(3_599), Countdown::MinutesSeconds { minutes: 59, seconds: 59 });
        assert_eq!(probe(61), Countdown::MinutesSeconds { minutes: 1, seconds: 1 });
        assert_eq!(probe(1), Countdown::MinutesSeconds { minutes: 0, seconds: 1 });
    }

    #[test]
    fn countdown_clamps_to_ended_and_never_regresses() {
        let boundary = at(500);
        assert_eq!(countdown(at(500), boundary), Countdown::Ended);
        assert_eq!(countdown(at(501), boundary), Countdown::Ended);
        assert_eq!(countdown(at(99_999), boundary), Countdown::Ended);

        // Remaining time is non-increasing as `now` advances.
        let secs_left = |c: Countdown| match c {
            Countdown::Ended => -1,
            Countdown::DaysHours { days, hours } => days * 86_400 + hours * 3_600,
            Countdown::HoursMinutes { hours, minutes } => hours * 3_600 + minutes * 60,
            Countdown::MinutesSeconds { minutes, seconds } => minutes * 60 + seconds,
        };
        let boundary = at(3 * 86_400);
        let mut last = i64::MAX;
        for step in (0..4 * 86_400).step_by(437) {
            let left = secs_left(countdown(at(step), boundary));
            assert!(left <= last, "countdown regressed at t+{step}");
            last = left;
        }
        assert_eq!(last, -1);
    }

    #[test]
    fn display_snapshot_is_consistent() {
        let (start, end) = (at(60), at(120));
        let state = display(at(0), start, end);
        assert_eq!(state.status, PollStatus::Upcoming);
        assert_eq!(state.urgency, Urgency::High);
        assert_eq!(state.countdown, Countdown::MinutesSeconds { minutes: 1, seconds: 0 });
        assert_eq!(state.countdown.to_string(), "1m 0s");

        let state = display(at(121), start, end);
        assert_eq!(state.status, PollStatus::Completed);
        assert_eq!(state.urgency, Urgency::None);
        assert_eq!(state.countdown.to_string(), "Ended");
    }
}
