//! Session, aggregate, and settings records shared across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One presence interval for a member in a guild.
///
/// A session with no `checkout_at` is **open**: the member is currently
/// checked in. `duration_ms` is set together with `checkout_at` and is
/// always `checkout_at - checkin_at`, never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub guild_id: String,
    pub member_id: String,
    /// 1-based position of this session among the member's sessions in this
    /// guild, assigned at check-in and never reused.
    pub sequence_number: i64,
    pub checkin_at: DateTime<Utc>,
    pub checkout_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    /// Calendar date of `checkin_at` in the configured timezone (`YYYY-MM-DD`).
    pub checkin_date: String,
    pub checkout_date: Option<String>,
}

impl Session {
    /// Whether the member is still checked in on this session.
    pub const fn is_open(&self) -> bool {
        self.checkout_at.is_none()
    }
}

/// A session about to be recorded; the store assigns the row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub guild_id: String,
    pub member_id: String,
    pub sequence_number: i64,
    pub checkin_at: DateTime<Utc>,
    pub checkin_date: String,
}

/// Running totals over a member's completed sessions in one guild.
///
/// Only ever incremented; there is no path that retracts a check-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTotals {
    pub total_duration_ms: i64,
    pub total_entries: i64,
}

/// One member's totals within a reporting window, keyed for ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTotalsRow {
    pub member_id: String,
    pub total_duration_ms: i64,
    pub total_entries: i64,
}

/// Per-guild configuration, created lazily with empty fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    pub guild_id: String,
    /// Channel that receives audit notifications, if configured.
    pub notify_channel_id: Option<String>,
    /// Role that grants the manager capability, if configured.
    pub manager_role_id: Option<String>,
}

impl GuildSettings {
    /// The default settings row for a guild that has none yet.
    pub fn new(guild_id: &str) -> Self {
        Self {
            guild_id: guild_id.to_string(),
            notify_channel_id: None,
            manager_role_id: None,
        }
    }

    /// Decides the manager capability for a caller whose administrator flag
    /// and role memberships were already resolved by the transport.
    /// Administrators always qualify.
    pub fn is_manager(&self, is_administrator: bool, roles: &[String]) -> bool {
        if is_administrator {
            return true;
        }
        self.manager_role_id
            .as_deref()
            .is_some_and(|role| roles.iter().any(|held| held == role))
    }
}

/// Formats a millisecond duration as `"Xh Ym Zs"`.
///
/// Negative inputs render as `"0h 0m 0s"`.
pub fn format_hms(ms: i64) -> String {
    let secs = (ms / 1000).max(0);
    let hours = secs / 3600;
    let minutes = secs % 3600 / 60;
    let seconds = secs % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_hms_full_day_of_work() {
        assert_eq!(format_hms(28_800_000), "8h 0m 0s");
    }

    #[test]
    fn format_hms_mixed_components() {
        assert_eq!(format_hms(3_661_000), "1h 1m 1s");
        assert_eq!(format_hms(59_999), "0h 0m 59s");
        assert_eq!(format_hms(0), "0h 0m 0s");
    }

    #[test]
    fn format_hms_clamps_negative_to_zero() {
        assert_eq!(format_hms(-5_000), "0h 0m 0s");
    }

    #[test]
    fn administrator_is_always_manager() {
        let settings = GuildSettings::new("g1");
        assert!(settings.is_manager(true, &[]));
    }

    #[test]
    fn manager_role_membership_grants_capability() {
        let settings = GuildSettings {
            manager_role_id: Some("mods".to_string()),
            ..GuildSettings::new("g1")
        };
        let roles = vec!["members".to_string(), "mods".to_string()];
        assert!(settings.is_manager(false, &roles));
        assert!(!settings.is_manager(false, &["members".to_string()]));
    }

    #[test]
    fn unconfigured_manager_role_grants_nothing() {
        let settings = GuildSettings::new("g1");
        assert!(!settings.is_manager(false, &["mods".to_string()]));
    }

    #[test]
    fn open_session_has_no_duration() {
        let session = Session {
            id: 1,
            guild_id: "g1".to_string(),
            member_id: "m1".to_string(),
            sequence_number: 1,
            checkin_at: Utc::now(),
            checkout_at: None,
            duration_ms: None,
            checkin_date: "2025-06-01".to_string(),
            checkout_date: None,
        };
        assert!(session.is_open());
    }
}
