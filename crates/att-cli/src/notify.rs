//! Notification delivery for the CLI frontend.
//!
//! The CLI has no chat transport, so audit lines are emitted through
//! `tracing` tagged with the destination channel; an operator can tail them
//! or route them with a subscriber.

use att_core::{Notifier, NotifyError};

/// Delivers audit notifications to the tracing output.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, channel_id: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(channel = %channel_id, "{message}");
        Ok(())
    }
}
