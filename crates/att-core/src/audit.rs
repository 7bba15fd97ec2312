//! Notification formatting for session transitions.
//!
//! Delivery goes through the transport-provided [`Notifier`]. A guild with
//! no configured notify channel drops events silently, and a delivery
//! failure is logged and swallowed; the action that produced the event has
//! already committed and must not fail after the fact.

use thiserror::Error;

use crate::calendar::Calendar;
use crate::session::{Session, format_hms};
use crate::store::SessionStore;

/// Which transition produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    CheckIn,
    CheckOut,
}

impl AuditKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "check-in",
            Self::CheckOut => "check-out",
        }
    }
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state transition ready to be rendered for the audit channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub kind: AuditKind,
    pub member_id: String,
    pub date: String,
    pub time: String,
    pub sequence_number: i64,
    pub duration_ms: Option<i64>,
}

impl AuditEvent {
    /// Builds the event for a just-opened session.
    pub fn check_in(session: &Session, calendar: Calendar) -> Self {
        Self {
            kind: AuditKind::CheckIn,
            member_id: session.member_id.clone(),
            date: session.checkin_date.clone(),
            time: calendar.time_of(session.checkin_at),
            sequence_number: session.sequence_number,
            duration_ms: None,
        }
    }

    /// Builds the event for a just-closed session, or `None` if the session
    /// is still open.
    pub fn check_out(session: &Session, calendar: Calendar) -> Option<Self> {
        let checkout_at = session.checkout_at?;
        Some(Self {
            kind: AuditKind::CheckOut,
            member_id: session.member_id.clone(),
            date: session
                .checkout_date
                .clone()
                .unwrap_or_else(|| calendar.date_of(checkout_at)),
            time: calendar.time_of(checkout_at),
            sequence_number: session.sequence_number,
            duration_ms: session.duration_ms,
        })
    }

    /// Renders the one-line notification message.
    pub fn message(&self) -> String {
        match self.duration_ms {
            Some(ms) => format!(
                "{} checked out of session #{} at {} on {} after {}",
                self.member_id,
                self.sequence_number,
                self.time,
                self.date,
                format_hms(ms),
            ),
            None => format!(
                "{} checked in for session #{} at {} on {}",
                self.member_id, self.sequence_number, self.time, self.date,
            ),
        }
    }
}

/// Transport-side delivery of notification text to a channel.
pub trait Notifier {
    fn deliver(&self, channel_id: &str, message: &str) -> Result<(), NotifyError>;
}

/// Delivery failure reported by the transport.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Sends the event to the guild's notify channel, if one is configured.
///
/// Never fails: a missing channel is a no-op, and settings or delivery
/// problems are logged and dropped.
pub fn notify<S: SessionStore, N: Notifier>(
    store: &S,
    notifier: &N,
    guild_id: &str,
    event: &AuditEvent,
) {
    let settings = match store.settings(guild_id) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(guild_id, error = %err, "could not load settings for audit event");
            return;
        }
    };
    let Some(channel_id) = settings.notify_channel_id else {
        return;
    };
    if let Err(err) = notifier.deliver(&channel_id, &event.message()) {
        tracing::warn!(guild_id, channel_id = %channel_id, error = %err, "audit notification dropped");
    }
}
