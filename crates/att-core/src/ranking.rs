//! Date-windowed aggregation and leaderboard ordering.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::session::MemberTotalsRow;
use crate::store::{SessionStore, StoreError, with_read_retry};

/// A reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Range {
    Day,
    Week,
    Month,
    #[serde(rename = "all")]
    AllTime,
}

impl Range {
    /// Number of trailing calendar days covered, `None` for all-time.
    pub const fn window_days(self) -> Option<i64> {
        match self {
            Self::Day => Some(1),
            Self::Week => Some(7),
            Self::Month => Some(30),
            Self::AllTime => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::AllTime => "all",
        }
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" | "all-time" => Ok(Self::AllTime),
            _ => Err(format!("invalid range: {s} (expected day, week, month, or all)")),
        }
    }
}

/// Computes the ranked attendance rows for a guild over `range`.
///
/// All-time reads the running totals table; day/week/month windows scan
/// completed sessions by checkout date, so open sessions never appear in
/// historical reports. The full ranking is returned; display truncation is
/// the caller's concern. An empty window yields an empty vector.
pub fn leaderboard<S: SessionStore>(
    store: &S,
    calendar: Calendar,
    now: DateTime<Utc>,
    guild_id: &str,
    range: Range,
) -> Result<Vec<MemberTotalsRow>, StoreError> {
    let mut rows = with_read_retry(|| match range.window_days() {
        None => store.guild_totals(guild_id),
        Some(days) => {
            let (start, end) = calendar.trailing_dates(now, days);
            store.completed_totals_between(guild_id, &start, &end)
        }
    })?;
    rank(&mut rows);
    Ok(rows)
}

/// Orders rows by total duration descending, then entry count descending.
///
/// The sort is stable, so rows tied on both keys keep the store's order
/// (member id).
pub fn rank(rows: &mut [MemberTotalsRow]) {
    rows.sort_by_key(|row| Reverse((row.total_duration_ms, row.total_entries)));
}
