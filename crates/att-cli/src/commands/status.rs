//! Status command: shows whether a member is currently checked in.

use std::io::Write;

use anyhow::Result;
use att_core::{Clock, MemberStatus, SessionEngine, SessionStore, format_hms};

pub fn run<W: Write, S: SessionStore, C: Clock>(
    writer: &mut W,
    engine: &SessionEngine<S, C>,
    guild_id: &str,
    member_id: &str,
) -> Result<()> {
    match engine.status(guild_id, member_id)? {
        MemberStatus::Out => {
            writeln!(writer, "{member_id} is OUT")?;
        }
        MemberStatus::In {
            sequence_number,
            checked_in_at,
            elapsed_ms,
        } => {
            let calendar = engine.calendar();
            writeln!(
                writer,
                "{member_id} is IN (session #{sequence_number}, since {} {}, elapsed {})",
                calendar.date_of(checked_in_at),
                calendar.time_of(checked_in_at),
                format_hms(elapsed_ms)
            )?;
        }
    }
    Ok(())
}
