//! Storage port for sessions, totals, and guild settings.
//!
//! The engine owns all session and totals mutation and reaches storage only
//! through [`SessionStore`]. Every method is a single atomic unit: in
//! particular, `insert_session` must reject a second open session for the
//! same (guild, member), and `close_session` must close the row and fold its
//! duration into the member's totals as one transaction. Two racing
//! transitions for the same member therefore resolve to one winner and one
//! clean rejection, never a half-applied state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::session::{GuildSettings, MemberTotals, MemberTotalsRow, NewSession, Session};

/// Storage failures surfaced to the engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The member already has an open session; the conditional insert lost.
    #[error("member already has an open session")]
    OpenSessionExists,
    /// There was no open session to close.
    #[error("member has no open session")]
    NoOpenSession,
    /// Failure in the storage backend itself.
    #[error("storage backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Durable state behind the attendance engine.
pub trait SessionStore {
    /// Returns the guild's settings, creating the default row on first
    /// access.
    fn settings(&self, guild_id: &str) -> Result<GuildSettings, StoreError>;

    /// Overwrites the guild's audit notification channel.
    fn set_notify_channel(&self, guild_id: &str, channel_id: &str) -> Result<(), StoreError>;

    /// Overwrites the guild's manager role.
    fn set_manager_role(&self, guild_id: &str, role_id: &str) -> Result<(), StoreError>;

    /// The member's currently open session, if any.
    fn open_session(&self, guild_id: &str, member_id: &str)
    -> Result<Option<Session>, StoreError>;

    /// Count of the member's sessions in the guild, open or closed.
    fn session_count(&self, guild_id: &str, member_id: &str) -> Result<i64, StoreError>;

    /// Records a new open session, failing with
    /// [`StoreError::OpenSessionExists`] if the member already has one.
    fn insert_session(&self, session: NewSession) -> Result<Session, StoreError>;

    /// Closes the member's open session at `checkout_at` and adds its
    /// duration to the member's running totals, atomically. Fails with
    /// [`StoreError::NoOpenSession`] if nothing is open.
    fn close_session(
        &self,
        guild_id: &str,
        member_id: &str,
        checkout_at: DateTime<Utc>,
        checkout_date: &str,
    ) -> Result<Session, StoreError>;

    /// All-time totals for one member.
    fn member_totals(&self, guild_id: &str, member_id: &str) -> Result<MemberTotals, StoreError>;

    /// All-time totals for every member of the guild, ordered by member id.
    fn guild_totals(&self, guild_id: &str) -> Result<Vec<MemberTotalsRow>, StoreError>;

    /// Per-member totals over completed sessions whose checkout date falls
    /// within `[start_date, end_date]` inclusive, ordered by member id.
    fn completed_totals_between(
        &self,
        guild_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<MemberTotalsRow>, StoreError>;
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn settings(&self, guild_id: &str) -> Result<GuildSettings, StoreError> {
        (**self).settings(guild_id)
    }

    fn set_notify_channel(&self, guild_id: &str, channel_id: &str) -> Result<(), StoreError> {
        (**self).set_notify_channel(guild_id, channel_id)
    }

    fn set_manager_role(&self, guild_id: &str, role_id: &str) -> Result<(), StoreError> {
        (**self).set_manager_role(guild_id, role_id)
    }

    fn open_session(
        &self,
        guild_id: &str,
        member_id: &str,
    ) -> Result<Option<Session>, StoreError> {
        (**self).open_session(guild_id, member_id)
    }

    fn session_count(&self, guild_id: &str, member_id: &str) -> Result<i64, StoreError> {
        (**self).session_count(guild_id, member_id)
    }

    fn insert_session(&self, session: NewSession) -> Result<Session, StoreError> {
        (**self).insert_session(session)
    }

    fn close_session(
        &self,
        guild_id: &str,
        member_id: &str,
        checkout_at: DateTime<Utc>,
        checkout_date: &str,
    ) -> Result<Session, StoreError> {
        (**self).close_session(guild_id, member_id, checkout_at, checkout_date)
    }

    fn member_totals(&self, guild_id: &str, member_id: &str) -> Result<MemberTotals, StoreError> {
        (**self).member_totals(guild_id, member_id)
    }

    fn guild_totals(&self, guild_id: &str) -> Result<Vec<MemberTotalsRow>, StoreError> {
        (**self).guild_totals(guild_id)
    }

    fn completed_totals_between(
        &self,
        guild_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<MemberTotalsRow>, StoreError> {
        (**self).completed_totals_between(guild_id, start_date, end_date)
    }
}

/// Retries a read-only query once on a backend failure.
///
/// Mutations must not go through this: a blind retry of a write risks double
/// effects, so those surface their first failure unchanged.
pub(crate) fn with_read_retry<T>(
    mut query: impl FnMut() -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    match query() {
        Err(StoreError::Backend(err)) => {
            tracing::debug!(error = %err, "read-only query failed, retrying once");
            query()
        }
        other => other,
    }
}

/// In-memory store for tests and ephemeral runs.
///
/// A single mutex around the whole state makes each port method atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    sessions: Vec<Session>,
    settings: HashMap<String, GuildSettings>,
    totals: HashMap<(String, String), MemberTotals>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn settings(&self, guild_id: &str) -> Result<GuildSettings, StoreError> {
        let mut inner = self.lock();
        Ok(inner
            .settings
            .entry(guild_id.to_string())
            .or_insert_with(|| GuildSettings::new(guild_id))
            .clone())
    }

    fn set_notify_channel(&self, guild_id: &str, channel_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner
            .settings
            .entry(guild_id.to_string())
            .or_insert_with(|| GuildSettings::new(guild_id))
            .notify_channel_id = Some(channel_id.to_string());
        Ok(())
    }

    fn set_manager_role(&self, guild_id: &str, role_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner
            .settings
            .entry(guild_id.to_string())
            .or_insert_with(|| GuildSettings::new(guild_id))
            .manager_role_id = Some(role_id.to_string());
        Ok(())
    }

    fn open_session(
        &self,
        guild_id: &str,
        member_id: &str,
    ) -> Result<Option<Session>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .sessions
            .iter()
            .find(|s| s.guild_id == guild_id && s.member_id == member_id && s.is_open())
            .cloned())
    }

    fn session_count(&self, guild_id: &str, member_id: &str) -> Result<i64, StoreError> {
        let inner = self.lock();
        let count = inner
            .sessions
            .iter()
            .filter(|s| s.guild_id == guild_id && s.member_id == member_id)
            .count();
        Ok(count as i64)
    }

    fn insert_session(&self, session: NewSession) -> Result<Session, StoreError> {
        let mut inner = self.lock();
        let already_open = inner
            .sessions
            .iter()
            .any(|s| s.guild_id == session.guild_id && s.member_id == session.member_id && s.is_open());
        if already_open {
            return Err(StoreError::OpenSessionExists);
        }
        inner.next_id += 1;
        let row = Session {
            id: inner.next_id,
            guild_id: session.guild_id,
            member_id: session.member_id,
            sequence_number: session.sequence_number,
            checkin_at: session.checkin_at,
            checkout_at: None,
            duration_ms: None,
            checkin_date: session.checkin_date,
            checkout_date: None,
        };
        inner.sessions.push(row.clone());
        Ok(row)
    }

    fn close_session(
        &self,
        guild_id: &str,
        member_id: &str,
        checkout_at: DateTime<Utc>,
        checkout_date: &str,
    ) -> Result<Session, StoreError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let Some(row) = inner
            .sessions
            .iter_mut()
            .find(|s| s.guild_id == guild_id && s.member_id == member_id && s.is_open())
        else {
            return Err(StoreError::NoOpenSession);
        };
        let duration = (checkout_at - row.checkin_at).num_milliseconds().max(0);
        row.checkout_at = Some(checkout_at);
        row.checkout_date = Some(checkout_date.to_string());
        row.duration_ms = Some(duration);
        let closed = row.clone();

        let totals = inner
            .totals
            .entry((guild_id.to_string(), member_id.to_string()))
            .or_default();
        totals.total_duration_ms += duration;
        totals.total_entries += 1;
        Ok(closed)
    }

    fn member_totals(&self, guild_id: &str, member_id: &str) -> Result<MemberTotals, StoreError> {
        let inner = self.lock();
        Ok(inner
            .totals
            .get(&(guild_id.to_string(), member_id.to_string()))
            .copied()
            .unwrap_or_default())
    }

    fn guild_totals(&self, guild_id: &str) -> Result<Vec<MemberTotalsRow>, StoreError> {
        let inner = self.lock();
        let mut rows: Vec<MemberTotalsRow> = inner
            .totals
            .iter()
            .filter(|((guild, _), _)| guild == guild_id)
            .map(|((_, member), totals)| MemberTotalsRow {
                member_id: member.clone(),
                total_duration_ms: totals.total_duration_ms,
                total_entries: totals.total_entries,
            })
            .collect();
        rows.sort_by(|a, b| a.member_id.cmp(&b.member_id));
        Ok(rows)
    }

    fn completed_totals_between(
        &self,
        guild_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<MemberTotalsRow>, StoreError> {
        let inner = self.lock();
        let mut by_member: HashMap<&str, MemberTotals> = HashMap::new();
        for session in &inner.sessions {
            if session.guild_id != guild_id {
                continue;
            }
            // Date strings are fixed-width, so string comparison is date
            // comparison.
            let in_window = session
                .checkout_date
                .as_deref()
                .is_some_and(|date| date >= start_date && date <= end_date);
            if !in_window {
                continue;
            }
            let entry = by_member.entry(&session.member_id).or_default();
            entry.total_duration_ms += session.duration_ms.unwrap_or(0);
            entry.total_entries += 1;
        }
        let mut rows: Vec<MemberTotalsRow> = by_member
            .into_iter()
            .map(|(member, totals)| MemberTotalsRow {
                member_id: member.to_string(),
                total_duration_ms: totals.total_duration_ms,
                total_entries: totals.total_entries,
            })
            .collect();
        rows.sort_by(|a, b| a.member_id.cmp(&b.member_id));
        Ok(rows)
    }
}
