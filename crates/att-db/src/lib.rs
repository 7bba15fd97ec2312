//! Storage layer for the attendance tracker.
//!
//! Implements the [`att_core::SessionStore`] port on SQLite via `rusqlite`.
//!
//! # Thread Safety
//!
//! [`Database`] wraps its `rusqlite::Connection` in a `Mutex`, so it is
//! `Send + Sync` and each port method holds the lock for the duration of one
//! atomic unit. The engine's read-then-write sequences (check the open
//! session, insert or close it, bump the totals) therefore execute as single
//! transactions and cannot interleave partway through.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 with millisecond precision
//! (e.g. `2025-06-01T09:00:00.000Z`), always UTC, so lexicographic ordering
//! matches chronological ordering. Calendar dates are fixed-width
//! `YYYY-MM-DD` strings derived in the configured timezone by the caller,
//! which makes date-window queries plain `BETWEEN` comparisons.
//!
//! ## Open-session invariant
//!
//! At most one session per (guild, member) may be open at a time. The
//! unique partial index `idx_sessions_open` enforces this at the storage
//! layer, and the check-in insert is additionally guarded with
//! `WHERE NOT EXISTS` so a lost race surfaces as a clean conflict instead of
//! a corrupt second open row.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use att_core::{
    GuildSettings, MemberTotals, MemberTotalsRow, NewSession, Session, SessionStore, StoreError,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored session timestamp.
    #[error("invalid timestamp in session {session_id}: {timestamp}")]
    TimestampParse {
        session_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        tracing::debug!(path = ?path, "opened attendance database");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.lock().execute_batch(
            "
            CREATE TABLE IF NOT EXISTS settings (
                guild_id TEXT PRIMARY KEY,
                notify_channel_id TEXT,
                manager_role_id TEXT
            );

            -- Sessions: one row per presence interval.
            -- checkin_at/checkout_at: RFC 3339 UTC; *_date: YYYY-MM-DD in
            -- the configured timezone; duration_ms set iff checkout_at set.
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guild_id TEXT NOT NULL,
                member_id TEXT NOT NULL,
                sequence_number INTEGER NOT NULL,
                checkin_at TEXT NOT NULL,
                checkout_at TEXT,
                duration_ms INTEGER,
                checkin_date TEXT NOT NULL,
                checkout_date TEXT
            );

            -- At most one open session per (guild, member).
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_open
            ON sessions(guild_id, member_id)
            WHERE checkout_at IS NULL;

            CREATE INDEX IF NOT EXISTS idx_sessions_checkout_date
            ON sessions(guild_id, checkout_date);

            CREATE TABLE IF NOT EXISTS member_totals (
                guild_id TEXT NOT NULL,
                member_id TEXT NOT NULL,
                total_duration_ms INTEGER NOT NULL DEFAULT 0,
                total_entries INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (guild_id, member_id)
            );
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(timestamp: &str, session_id: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            session_id,
            timestamp: timestamp.to_string(),
            source,
        })
}

/// A session row as read from SQLite, timestamps still unparsed.
#[derive(Debug)]
struct RawSession {
    id: i64,
    guild_id: String,
    member_id: String,
    sequence_number: i64,
    checkin_at: String,
    checkout_at: Option<String>,
    duration_ms: Option<i64>,
    checkin_date: String,
    checkout_date: Option<String>,
}

impl RawSession {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            member_id: row.get(2)?,
            sequence_number: row.get(3)?,
            checkin_at: row.get(4)?,
            checkout_at: row.get(5)?,
            duration_ms: row.get(6)?,
            checkin_date: row.get(7)?,
            checkout_date: row.get(8)?,
        })
    }

    fn into_session(self) -> Result<Session, DbError> {
        let checkin_at = parse_timestamp(&self.checkin_at, self.id)?;
        let checkout_at = self
            .checkout_at
            .as_deref()
            .map(|raw| parse_timestamp(raw, self.id))
            .transpose()?;
        Ok(Session {
            id: self.id,
            guild_id: self.guild_id,
            member_id: self.member_id,
            sequence_number: self.sequence_number,
            checkin_at,
            checkout_at,
            duration_ms: self.duration_ms,
            checkin_date: self.checkin_date,
            checkout_date: self.checkout_date,
        })
    }
}

const SESSION_COLUMNS: &str = "id, guild_id, member_id, sequence_number, checkin_at, \
                               checkout_at, duration_ms, checkin_date, checkout_date";

impl SessionStore for Database {
    fn settings(&self, guild_id: &str) -> Result<GuildSettings, StoreError> {
        let conn = self.lock();
        let existing = conn
            .query_row(
                "SELECT guild_id, notify_channel_id, manager_role_id
                 FROM settings WHERE guild_id = ?1",
                [guild_id],
                |row| {
                    Ok(GuildSettings {
                        guild_id: row.get(0)?,
                        notify_channel_id: row.get(1)?,
                        manager_role_id: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(DbError::from)?;
        if let Some(settings) = existing {
            return Ok(settings);
        }
        conn.execute("INSERT OR IGNORE INTO settings (guild_id) VALUES (?1)", [
            guild_id,
        ])
        .map_err(DbError::from)?;
        Ok(GuildSettings::new(guild_id))
    }

    fn set_notify_channel(&self, guild_id: &str, channel_id: &str) -> Result<(), StoreError> {
        self.lock()
            .execute(
                "INSERT INTO settings (guild_id, notify_channel_id) VALUES (?1, ?2)
                 ON CONFLICT(guild_id) DO UPDATE SET
                     notify_channel_id = excluded.notify_channel_id",
                params![guild_id, channel_id],
            )
            .map_err(DbError::from)?;
        Ok(())
    }

    fn set_manager_role(&self, guild_id: &str, role_id: &str) -> Result<(), StoreError> {
        self.lock()
            .execute(
                "INSERT INTO settings (guild_id, manager_role_id) VALUES (?1, ?2)
                 ON CONFLICT(guild_id) DO UPDATE SET
                     manager_role_id = excluded.manager_role_id",
                params![guild_id, role_id],
            )
            .map_err(DbError::from)?;
        Ok(())
    }

    fn open_session(
        &self,
        guild_id: &str,
        member_id: &str,
    ) -> Result<Option<Session>, StoreError> {
        let raw = self
            .lock()
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE guild_id = ?1 AND member_id = ?2 AND checkout_at IS NULL"
                ),
                params![guild_id, member_id],
                RawSession::from_row,
            )
            .optional()
            .map_err(DbError::from)?;
        Ok(raw.map(RawSession::into_session).transpose()?)
    }

    fn session_count(&self, guild_id: &str, member_id: &str) -> Result<i64, StoreError> {
        let count = self
            .lock()
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE guild_id = ?1 AND member_id = ?2",
                params![guild_id, member_id],
                |row| row.get(0),
            )
            .map_err(DbError::from)?;
        Ok(count)
    }

    fn insert_session(&self, session: NewSession) -> Result<Session, StoreError> {
        let conn = self.lock();
        let inserted = conn.execute(
            "INSERT INTO sessions
             (guild_id, member_id, sequence_number, checkin_at, checkin_date)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE NOT EXISTS (
                 SELECT 1 FROM sessions
                 WHERE guild_id = ?1 AND member_id = ?2 AND checkout_at IS NULL
             )",
            params![
                session.guild_id,
                session.member_id,
                session.sequence_number,
                format_timestamp(session.checkin_at),
                session.checkin_date,
            ],
        );
        let inserted = match inserted {
            Ok(count) => count,
            // The unique open-session index backs the NOT EXISTS guard; a
            // constraint hit is the same rejection.
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::OpenSessionExists);
            }
            Err(err) => return Err(DbError::from(err).into()),
        };
        if inserted == 0 {
            return Err(StoreError::OpenSessionExists);
        }
        Ok(Session {
            id: conn.last_insert_rowid(),
            guild_id: session.guild_id,
            member_id: session.member_id,
            sequence_number: session.sequence_number,
            checkin_at: session.checkin_at,
            checkout_at: None,
            duration_ms: None,
            checkin_date: session.checkin_date,
            checkout_date: None,
        })
    }

    fn close_session(
        &self,
        guild_id: &str,
        member_id: &str,
        checkout_at: DateTime<Utc>,
        checkout_date: &str,
    ) -> Result<Session, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DbError::from)?;

        let open = tx
            .query_row(
                "SELECT id, sequence_number, checkin_at, checkin_date FROM sessions
                 WHERE guild_id = ?1 AND member_id = ?2 AND checkout_at IS NULL",
                params![guild_id, member_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(DbError::from)?;
        let Some((id, sequence_number, checkin_raw, checkin_date)) = open else {
            return Err(StoreError::NoOpenSession);
        };

        let checkin_at = parse_timestamp(&checkin_raw, id)?;
        let duration_ms = (checkout_at - checkin_at).num_milliseconds().max(0);

        let updated = tx
            .execute(
                "UPDATE sessions SET checkout_at = ?1, checkout_date = ?2, duration_ms = ?3
                 WHERE id = ?4 AND checkout_at IS NULL",
                params![format_timestamp(checkout_at), checkout_date, duration_ms, id],
            )
            .map_err(DbError::from)?;
        if updated == 0 {
            return Err(StoreError::NoOpenSession);
        }

        tx.execute(
            "INSERT INTO member_totals (guild_id, member_id, total_duration_ms, total_entries)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(guild_id, member_id) DO UPDATE SET
                 total_duration_ms = total_duration_ms + excluded.total_duration_ms,
                 total_entries = total_entries + 1",
            params![guild_id, member_id, duration_ms],
        )
        .map_err(DbError::from)?;

        tx.commit().map_err(DbError::from)?;
        Ok(Session {
            id,
            guild_id: guild_id.to_string(),
            member_id: member_id.to_string(),
            sequence_number,
            checkin_at,
            checkout_at: Some(checkout_at),
            duration_ms: Some(duration_ms),
            checkin_date,
            checkout_date: Some(checkout_date.to_string()),
        })
    }

    fn member_totals(&self, guild_id: &str, member_id: &str) -> Result<MemberTotals, StoreError> {
        let totals = self
            .lock()
            .query_row(
                "SELECT total_duration_ms, total_entries FROM member_totals
                 WHERE guild_id = ?1 AND member_id = ?2",
                params![guild_id, member_id],
                |row| {
                    Ok(MemberTotals {
                        total_duration_ms: row.get(0)?,
                        total_entries: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(DbError::from)?;
        Ok(totals.unwrap_or_default())
    }

    fn guild_totals(&self, guild_id: &str) -> Result<Vec<MemberTotalsRow>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT member_id, total_duration_ms, total_entries
                 FROM member_totals
                 WHERE guild_id = ?1
                 ORDER BY member_id ASC",
            )
            .map_err(DbError::from)?;
        let rows = stmt
            .query_map([guild_id], |row| {
                Ok(MemberTotalsRow {
                    member_id: row.get(0)?,
                    total_duration_ms: row.get(1)?,
                    total_entries: row.get(2)?,
                })
            })
            .map_err(DbError::from)?;
        let mut totals = Vec::new();
        for row in rows {
            totals.push(row.map_err(DbError::from)?);
        }
        Ok(totals)
    }

    fn completed_totals_between(
        &self,
        guild_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<MemberTotalsRow>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT member_id, SUM(duration_ms), COUNT(*)
                 FROM sessions
                 WHERE guild_id = ?1
                   AND checkout_at IS NOT NULL
                   AND checkout_date BETWEEN ?2 AND ?3
                 GROUP BY member_id
                 ORDER BY member_id ASC",
            )
            .map_err(DbError::from)?;
        let rows = stmt
            .query_map(params![guild_id, start_date, end_date], |row| {
                Ok(MemberTotalsRow {
                    member_id: row.get(0)?,
                    total_duration_ms: row.get(1)?,
                    total_entries: row.get(2)?,
                })
            })
            .map_err(DbError::from)?;
        let mut totals = Vec::new();
        for row in rows {
            totals.push(row.map_err(DbError::from)?);
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn instant(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("valid rfc3339")
            .with_timezone(&Utc)
    }

    fn new_session(guild: &str, member: &str, seq: i64, at: &str) -> NewSession {
        NewSession {
            guild_id: guild.to_string(),
            member_id: member.to_string(),
            sequence_number: seq,
            checkin_at: instant(at),
            checkin_date: at[..10].to_string(),
        }
    }

    fn table_columns(db: &Database, table: &str) -> Vec<String> {
        let conn = db.lock();
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(db: &Database, table: &str) -> HashSet<String> {
        let conn = db.lock();
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn open_on_disk_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("attendance.db");
        {
            let db = Database::open(&path).unwrap();
            db.insert_session(new_session("g1", "m1", 1, "2025-06-01T09:00:00Z"))
                .unwrap();
        }
        // Re-opening runs init() again and keeps existing rows.
        let db = Database::open(&path).unwrap();
        assert_eq!(db.session_count("g1", "m1").unwrap(), 1);
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(table_columns(&db, "settings"), vec![
            "guild_id",
            "notify_channel_id",
            "manager_role_id",
        ]);
        assert_eq!(table_columns(&db, "sessions"), vec![
            "id",
            "guild_id",
            "member_id",
            "sequence_number",
            "checkin_at",
            "checkout_at",
            "duration_ms",
            "checkin_date",
            "checkout_date",
        ]);
        assert_eq!(table_columns(&db, "member_totals"), vec![
            "guild_id",
            "member_id",
            "total_duration_ms",
            "total_entries",
        ]);

        let session_indexes = index_names(&db, "sessions");
        assert!(session_indexes.contains("idx_sessions_open"));
        assert!(session_indexes.contains("idx_sessions_checkout_date"));
    }

    #[test]
    fn settings_row_is_created_lazily() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.settings("g1").unwrap(), GuildSettings::new("g1"));

        db.set_notify_channel("g1", "audit").unwrap();
        db.set_manager_role("g1", "mods").unwrap();
        let settings = db.settings("g1").unwrap();
        assert_eq!(settings.notify_channel_id.as_deref(), Some("audit"));
        assert_eq!(settings.manager_role_id.as_deref(), Some("mods"));

        // Overwrite keeps the other field intact.
        db.set_notify_channel("g1", "audit-2").unwrap();
        let settings = db.settings("g1").unwrap();
        assert_eq!(settings.notify_channel_id.as_deref(), Some("audit-2"));
        assert_eq!(settings.manager_role_id.as_deref(), Some("mods"));
    }

    #[test]
    fn guarded_insert_rejects_second_open_session() {
        let db = Database::open_in_memory().unwrap();
        db.insert_session(new_session("g1", "m1", 1, "2025-06-01T09:00:00Z"))
            .unwrap();
        let err = db
            .insert_session(new_session("g1", "m1", 2, "2025-06-01T09:00:01Z"))
            .unwrap_err();
        assert!(matches!(err, StoreError::OpenSessionExists));
        assert_eq!(db.session_count("g1", "m1").unwrap(), 1);
    }

    #[test]
    fn unique_index_rejects_raw_second_open_row() {
        let db = Database::open_in_memory().unwrap();
        db.insert_session(new_session("g1", "m1", 1, "2025-06-01T09:00:00Z"))
            .unwrap();
        // Bypass the guarded insert; the partial index must still hold.
        let result = db.lock().execute(
            "INSERT INTO sessions
             (guild_id, member_id, sequence_number, checkin_at, checkin_date)
             VALUES ('g1', 'm1', 2, '2025-06-01T09:00:01.000Z', '2025-06-01')",
            [],
        );
        assert!(matches!(
            result,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        ));
    }

    #[test]
    fn close_session_updates_row_and_totals_in_one_transaction() {
        let db = Database::open_in_memory().unwrap();
        db.insert_session(new_session("g1", "m1", 1, "2025-06-01T09:00:00Z"))
            .unwrap();
        let closed = db
            .close_session("g1", "m1", instant("2025-06-01T17:00:00Z"), "2025-06-01")
            .unwrap();
        assert_eq!(closed.sequence_number, 1);
        assert_eq!(closed.duration_ms, Some(28_800_000));
        assert_eq!(closed.checkout_date.as_deref(), Some("2025-06-01"));

        let totals = db.member_totals("g1", "m1").unwrap();
        assert_eq!(totals.total_duration_ms, 28_800_000);
        assert_eq!(totals.total_entries, 1);
        assert!(db.open_session("g1", "m1").unwrap().is_none());
    }

    #[test]
    fn close_without_open_session_leaves_totals_untouched() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .close_session("g1", "m1", instant("2025-06-01T17:00:00Z"), "2025-06-01")
            .unwrap_err();
        assert!(matches!(err, StoreError::NoOpenSession));
        assert_eq!(db.member_totals("g1", "m1").unwrap(), MemberTotals::default());
    }

    #[test]
    fn member_can_reopen_after_closing() {
        let db = Database::open_in_memory().unwrap();
        db.insert_session(new_session("g1", "m1", 1, "2025-06-01T09:00:00Z"))
            .unwrap();
        db.close_session("g1", "m1", instant("2025-06-01T10:00:00Z"), "2025-06-01")
            .unwrap();
        let session = db
            .insert_session(new_session("g1", "m1", 2, "2025-06-01T11:00:00Z"))
            .unwrap();
        assert_eq!(session.sequence_number, 2);
        assert_eq!(db.session_count("g1", "m1").unwrap(), 2);
    }

    #[test]
    fn totals_accumulate_across_checkouts() {
        let db = Database::open_in_memory().unwrap();
        for (seq, start, end) in [
            (1, "2025-06-01T09:00:00Z", "2025-06-01T10:00:00Z"),
            (2, "2025-06-02T09:00:00Z", "2025-06-02T09:30:00Z"),
        ] {
            db.insert_session(new_session("g1", "m1", seq, start)).unwrap();
            db.close_session("g1", "m1", instant(end), &end[..10]).unwrap();
        }
        let totals = db.member_totals("g1", "m1").unwrap();
        assert_eq!(totals.total_duration_ms, 5_400_000);
        assert_eq!(totals.total_entries, 2);

        let rows = db.guild_totals("g1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].member_id, "m1");
        assert_eq!(rows[0].total_duration_ms, 5_400_000);
    }

    #[test]
    fn windowed_totals_group_by_member_and_respect_bounds() {
        let db = Database::open_in_memory().unwrap();
        let sessions = [
            ("m1", 1, "2025-06-01T09:00:00Z", "2025-06-01T10:00:00Z"),
            ("m1", 2, "2025-06-03T09:00:00Z", "2025-06-03T09:30:00Z"),
            ("m2", 1, "2025-06-03T09:00:00Z", "2025-06-03T11:00:00Z"),
            // Outside the window below.
            ("m2", 2, "2025-06-04T09:00:00Z", "2025-06-04T10:00:00Z"),
        ];
        for (member, seq, start, end) in sessions {
            db.insert_session(new_session("g1", member, seq, start)).unwrap();
            db.close_session("g1", member, instant(end), &end[..10]).unwrap();
        }
        // Still open, must not count.
        db.insert_session(new_session("g1", "m3", 1, "2025-06-03T09:00:00Z"))
            .unwrap();

        let rows = db
            .completed_totals_between("g1", "2025-06-01", "2025-06-03")
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].member_id, "m1");
        assert_eq!(rows[0].total_duration_ms, 5_400_000);
        assert_eq!(rows[0].total_entries, 2);
        assert_eq!(rows[1].member_id, "m2");
        assert_eq!(rows[1].total_duration_ms, 7_200_000);
        assert_eq!(rows[1].total_entries, 1);
    }

    #[test]
    fn timestamps_are_stored_as_utc_millis() {
        let db = Database::open_in_memory().unwrap();
        db.insert_session(new_session("g1", "m1", 1, "2025-06-01T09:00:00Z"))
            .unwrap();
        let stored: String = db
            .lock()
            .query_row("SELECT checkin_at FROM sessions WHERE id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(stored, "2025-06-01T09:00:00.000Z");

        let open = db.open_session("g1", "m1").unwrap().unwrap();
        assert_eq!(open.checkin_at, instant("2025-06-01T09:00:00Z"));
    }

    #[test]
    fn clock_skew_clamps_duration_at_zero() {
        let db = Database::open_in_memory().unwrap();
        db.insert_session(new_session("g1", "m1", 1, "2025-06-01T09:00:00Z"))
            .unwrap();
        let closed = db
            .close_session("g1", "m1", instant("2025-06-01T08:59:00Z"), "2025-06-01")
            .unwrap();
        assert_eq!(closed.duration_ms, Some(0));
    }
}
