//! Guild settings commands: notify channel and manager role.

use std::io::Write;

use anyhow::Result;
use att_core::SessionStore;

pub fn set_notify_channel<W: Write, S: SessionStore>(
    writer: &mut W,
    store: &S,
    guild_id: &str,
    channel_id: &str,
    is_administrator: bool,
) -> Result<()> {
    if !is_administrator {
        writeln!(
            writer,
            "not authorized: changing settings requires the administrator capability"
        )?;
        return Ok(());
    }
    store.set_notify_channel(guild_id, channel_id)?;
    writeln!(writer, "notify channel for guild {guild_id} set to {channel_id}")?;
    Ok(())
}

pub fn set_manager_role<W: Write, S: SessionStore>(
    writer: &mut W,
    store: &S,
    guild_id: &str,
    role_id: &str,
    is_administrator: bool,
) -> Result<()> {
    if !is_administrator {
        writeln!(
            writer,
            "not authorized: changing settings requires the administrator capability"
        )?;
        return Ok(());
    }
    store.set_manager_role(guild_id, role_id)?;
    writeln!(writer, "manager role for guild {guild_id} set to {role_id}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use att_core::MemoryStore;
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn non_administrator_cannot_change_settings() {
        let store = MemoryStore::new();
        let mut out = Vec::new();
        set_notify_channel(&mut out, &store, "g1", "audit", false).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_snapshot!(
            out.trim_end(),
            @"not authorized: changing settings requires the administrator capability"
        );
        assert!(store.settings("g1").unwrap().notify_channel_id.is_none());
    }

    #[test]
    fn administrator_sets_both_fields() {
        let store = MemoryStore::new();
        let mut out = Vec::new();
        set_notify_channel(&mut out, &store, "g1", "audit", true).unwrap();
        set_manager_role(&mut out, &store, "g1", "mods", true).unwrap();

        let settings = store.settings("g1").unwrap();
        assert_eq!(settings.notify_channel_id.as_deref(), Some("audit"));
        assert_eq!(settings.manager_role_id.as_deref(), Some("mods"));

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("notify channel for guild g1 set to audit"));
        assert!(out.contains("manager role for guild g1 set to mods"));
    }
}
