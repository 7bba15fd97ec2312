//! The check-in/check-out state machine.
//!
//! A member in a guild is either `OUT` (no open session) or `IN` (exactly
//! one open session). [`SessionEngine`] is the only writer of session and
//! totals state; both transitions lean on the store's atomic conditional
//! writes, so duplicate or racing requests resolve to one winner and one
//! domain rejection. Rejections are ordinary result variants, not errors.

use chrono::{DateTime, Utc};

use crate::calendar::{Calendar, Clock};
use crate::session::{NewSession, Session};
use crate::store::{SessionStore, StoreError, with_read_retry};

/// Result of a check-in request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// A new open session was recorded.
    CheckedIn { session: Session },
    /// The member already had an open session; nothing was recorded.
    AlreadyCheckedIn,
}

/// Result of a check-out request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutOutcome {
    /// The open session was closed and folded into the member's totals.
    CheckedOut { session: Session },
    /// The member had no open session; nothing was changed.
    NoOpenSession,
}

/// Current presence of a member, as reported by [`SessionEngine::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberStatus {
    Out,
    In {
        sequence_number: i64,
        checked_in_at: DateTime<Utc>,
        elapsed_ms: i64,
    },
}

/// Orchestrates session transitions against an injected store and clock.
#[derive(Debug)]
pub struct SessionEngine<S, C> {
    store: S,
    clock: C,
    calendar: Calendar,
}

impl<S: SessionStore, C: Clock> SessionEngine<S, C> {
    pub fn new(store: S, clock: C, calendar: Calendar) -> Self {
        Self {
            store,
            clock,
            calendar,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Opens a session for the member.
    ///
    /// The sequence number counts all of the member's prior sessions in the
    /// guild, open or closed, so numbers are never reused even for sessions
    /// that are abandoned without a check-out.
    pub fn check_in(&self, guild_id: &str, member_id: &str) -> Result<CheckInOutcome, StoreError> {
        let now = self.clock.now();
        let prior = self.store.session_count(guild_id, member_id)?;
        let session = NewSession {
            guild_id: guild_id.to_string(),
            member_id: member_id.to_string(),
            sequence_number: prior + 1,
            checkin_at: now,
            checkin_date: self.calendar.date_of(now),
        };
        match self.store.insert_session(session) {
            Ok(session) => {
                tracing::info!(
                    guild_id,
                    member_id,
                    sequence = session.sequence_number,
                    "member checked in"
                );
                Ok(CheckInOutcome::CheckedIn { session })
            }
            Err(StoreError::OpenSessionExists) => Ok(CheckInOutcome::AlreadyCheckedIn),
            Err(err) => Err(err),
        }
    }

    /// Closes the member's open session and updates their running totals.
    pub fn check_out(
        &self,
        guild_id: &str,
        member_id: &str,
    ) -> Result<CheckOutOutcome, StoreError> {
        let now = self.clock.now();
        let date = self.calendar.date_of(now);
        match self.store.close_session(guild_id, member_id, now, &date) {
            Ok(session) => {
                tracing::info!(
                    guild_id,
                    member_id,
                    sequence = session.sequence_number,
                    duration_ms = session.duration_ms,
                    "member checked out"
                );
                Ok(CheckOutOutcome::CheckedOut { session })
            }
            Err(StoreError::NoOpenSession) => Ok(CheckOutOutcome::NoOpenSession),
            Err(err) => Err(err),
        }
    }

    /// Reports whether the member is currently checked in. Side-effect free.
    pub fn status(&self, guild_id: &str, member_id: &str) -> Result<MemberStatus, StoreError> {
        let now = self.clock.now();
        let open = with_read_retry(|| self.store.open_session(guild_id, member_id))?;
        Ok(match open {
            Some(session) => MemberStatus::In {
                sequence_number: session.sequence_number,
                checked_in_at: session.checkin_at,
                elapsed_ms: (now - session.checkin_at).num_milliseconds().max(0),
            },
            None => MemberStatus::Out,
        })
    }
}
