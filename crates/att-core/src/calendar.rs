//! Wall-clock access and calendar-date bucketing.
//!
//! The clock is injected wherever the current instant is needed so tests can
//! pin time; the calendar turns instants into fixed-width `YYYY-MM-DD` date
//! strings whose lexicographic order matches chronological order.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use thiserror::Error;

/// Produces the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Returns a preset instant, adjustable between calls. Test clock.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Advances the clock by `ms` milliseconds.
    pub fn advance_ms(&self, ms: i64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += Duration::milliseconds(ms);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A timezone string that does not parse as a UTC offset.
#[derive(Debug, Error)]
#[error("invalid utc offset: {0} (expected e.g. +03:00)")]
pub struct InvalidOffset(pub String);

/// Derives calendar dates from instants at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Parses offsets of the form `+03:00` or `-05:30`.
    pub fn parse(offset: &str) -> Result<Self, InvalidOffset> {
        offset
            .parse::<FixedOffset>()
            .map(Self::new)
            .map_err(|_| InvalidOffset(offset.to_string()))
    }

    /// Calendar date of `instant` in the configured timezone, `YYYY-MM-DD`.
    pub fn date_of(&self, instant: DateTime<Utc>) -> String {
        self.local_date(instant).format("%Y-%m-%d").to_string()
    }

    /// Time of day of `instant` in the configured timezone, 24h `HH:MM:SS`.
    pub fn time_of(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format("%H:%M:%S")
            .to_string()
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Inclusive `[start, end]` date strings covering the trailing `days`
    /// calendar days ending on `instant`'s date. `days = 1` yields today
    /// only.
    pub fn trailing_dates(&self, instant: DateTime<Utc>, days: i64) -> (String, String) {
        let end = self.local_date(instant);
        let start = end - Duration::days(days.max(1) - 1);
        (
            start.format("%Y-%m-%d").to_string(),
            end.format("%Y-%m-%d").to_string(),
        )
    }
}
