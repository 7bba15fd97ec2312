//! Report and leaderboard commands over ranked attendance rows.
//!
//! Both commands share one renderer: the ranking component returns the full
//! ordered sequence and truncation to the configured display limit happens
//! here. Reports are manager-gated and windowed; the leaderboard is public
//! and also offers the all-time range.

use std::io::Write;

use anyhow::{Result, bail};
use att_core::{Calendar, MemberTotalsRow, Range, SessionStore, format_hms, ranking};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// JSON shape of one ranked row.
#[derive(Debug, Serialize)]
struct JsonRow<'a> {
    member_id: &'a str,
    total_duration_ms: i64,
    total_entries: i64,
    total_hms: String,
}

/// JSON shape of a rendered report or leaderboard.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    guild_id: &'a str,
    range: Range,
    rows: Vec<JsonRow<'a>>,
}

/// Runs the manager-gated attendance report.
#[expect(clippy::too_many_arguments, reason = "thin dispatch surface")]
pub fn report<W: Write, S: SessionStore>(
    writer: &mut W,
    store: &S,
    calendar: Calendar,
    now: DateTime<Utc>,
    guild_id: &str,
    range: Range,
    is_manager: bool,
    limit: usize,
    json: bool,
) -> Result<()> {
    if !is_manager {
        writeln!(
            writer,
            "not authorized: attendance reports require the manager capability"
        )?;
        return Ok(());
    }
    if range == Range::AllTime {
        bail!("report covers day, week, or month; use leaderboard for all-time");
    }
    render(writer, store, calendar, now, guild_id, range, limit, json)
}

/// Runs the public leaderboard.
#[expect(clippy::too_many_arguments, reason = "thin dispatch surface")]
pub fn show_leaderboard<W: Write, S: SessionStore>(
    writer: &mut W,
    store: &S,
    calendar: Calendar,
    now: DateTime<Utc>,
    guild_id: &str,
    range: Range,
    limit: usize,
    json: bool,
) -> Result<()> {
    render(writer, store, calendar, now, guild_id, range, limit, json)
}

#[expect(clippy::too_many_arguments, reason = "thin dispatch surface")]
fn render<W: Write, S: SessionStore>(
    writer: &mut W,
    store: &S,
    calendar: Calendar,
    now: DateTime<Utc>,
    guild_id: &str,
    range: Range,
    limit: usize,
    json: bool,
) -> Result<()> {
    let rows = ranking::leaderboard(store, calendar, now, guild_id, range)?;

    if json {
        let report = JsonReport {
            guild_id,
            range,
            rows: rows
                .iter()
                .take(limit)
                .map(|row| JsonRow {
                    member_id: &row.member_id,
                    total_duration_ms: row.total_duration_ms,
                    total_entries: row.total_entries,
                    total_hms: format_hms(row.total_duration_ms),
                })
                .collect(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(writer, "Attendance ({range}) for guild {guild_id}")?;
    if rows.is_empty() {
        writeln!(writer, "No completed sessions in this range.")?;
        return Ok(());
    }
    for (position, row) in rows.iter().take(limit).enumerate() {
        write_row(writer, position + 1, row)?;
    }
    let hidden = rows.len().saturating_sub(limit);
    if hidden > 0 {
        writeln!(writer, "... and {hidden} more")?;
    }
    Ok(())
}

fn write_row<W: Write>(writer: &mut W, position: usize, row: &MemberTotalsRow) -> Result<()> {
    writeln!(
        writer,
        "{position:>3}. {:<24} {:>12}  sessions: {}",
        row.member_id,
        format_hms(row.total_duration_ms),
        row.total_entries
    )?;
    Ok(())
}
