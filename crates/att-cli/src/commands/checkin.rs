//! Check-in command: opens a presence session for a member.

use std::io::Write;

use anyhow::Result;
use att_core::audit::{self, AuditEvent, Notifier};
use att_core::{CheckInOutcome, Clock, SessionEngine, SessionStore};

pub fn run<W: Write, S: SessionStore, C: Clock, N: Notifier>(
    writer: &mut W,
    engine: &SessionEngine<S, C>,
    notifier: &N,
    guild_id: &str,
    member_id: &str,
) -> Result<()> {
    match engine.check_in(guild_id, member_id)? {
        CheckInOutcome::CheckedIn { session } => {
            writeln!(
                writer,
                "{member_id} checked in (session #{})",
                session.sequence_number
            )?;
            let event = AuditEvent::check_in(&session, engine.calendar());
            audit::notify(engine.store(), notifier, guild_id, &event);
        }
        CheckInOutcome::AlreadyCheckedIn => {
            writeln!(writer, "{member_id} is already checked in")?;
        }
    }
    Ok(())
}
