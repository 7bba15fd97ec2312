//! Check-out command: closes the member's open session.

use std::io::Write;

use anyhow::Result;
use att_core::audit::{self, AuditEvent, Notifier};
use att_core::{CheckOutOutcome, Clock, SessionEngine, SessionStore, format_hms};

pub fn run<W: Write, S: SessionStore, C: Clock, N: Notifier>(
    writer: &mut W,
    engine: &SessionEngine<S, C>,
    notifier: &N,
    guild_id: &str,
    member_id: &str,
) -> Result<()> {
    match engine.check_out(guild_id, member_id)? {
        CheckOutOutcome::CheckedOut { session } => {
            writeln!(
                writer,
                "{member_id} checked out after {} (session #{})",
                format_hms(session.duration_ms.unwrap_or(0)),
                session.sequence_number
            )?;
            if let Some(event) = AuditEvent::check_out(&session, engine.calendar()) {
                audit::notify(engine.store(), notifier, guild_id, &event);
            }
        }
        CheckOutOutcome::NoOpenSession => {
            writeln!(writer, "{member_id} has no open session")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use att_core::{Calendar, FixedClock, MemoryStore};
    use chrono::{DateTime, Utc};
    use insta::assert_snapshot;

    use super::*;
    use crate::LogNotifier;
    use crate::commands::checkin;

    fn instant(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn check_out_reports_duration_and_sequence() {
        let clock = FixedClock::new(instant("2025-06-01T09:00:00Z"));
        let engine = SessionEngine::new(MemoryStore::new(), &clock, Calendar::utc());
        let mut out = Vec::new();
        checkin::run(&mut out, &engine, &LogNotifier, "g1", "alice").unwrap();
        out.clear();

        clock.advance_ms(3_600_000);
        run(&mut out, &engine, &LogNotifier, "g1", "alice").unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_snapshot!(out.trim_end(), @"alice checked out after 1h 0m 0s (session #1)");
    }

    #[test]
    fn check_out_without_session_is_an_informative_message() {
        let clock = FixedClock::new(instant("2025-06-01T09:00:00Z"));
        let engine = SessionEngine::new(MemoryStore::new(), &clock, Calendar::utc());
        let mut out = Vec::new();
        run(&mut out, &engine, &LogNotifier, "g1", "alice").unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_snapshot!(out.trim_end(), @"alice has no open session");
    }
}
