//! Command-line argument definitions.

use std::path::PathBuf;

use att_core::Range;
use clap::{Parser, Subcommand};

/// Attendance tracker for guild members.
///
/// Records check-in/check-out presence sessions per guild and member, keeps
/// running totals, and ranks members over day/week/month/all-time windows.
#[derive(Debug, Parser)]
#[command(name = "att", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open a presence session for a member.
    CheckIn {
        /// Guild the session belongs to.
        #[arg(long)]
        guild: String,

        /// Member checking in.
        #[arg(long)]
        member: String,
    },

    /// Close the member's open session and record its duration.
    CheckOut {
        #[arg(long)]
        guild: String,

        #[arg(long)]
        member: String,
    },

    /// Show whether a member is currently checked in.
    Status {
        #[arg(long)]
        guild: String,

        #[arg(long)]
        member: String,
    },

    /// Ranked attendance report over a trailing window (managers only).
    Report {
        #[arg(long)]
        guild: String,

        /// day, week, or month.
        #[arg(long)]
        range: Range,

        /// Caller holds the administrator capability (resolved upstream).
        #[arg(long)]
        admin: bool,

        /// Role ids held by the caller, comma separated.
        #[arg(long, value_delimiter = ',')]
        roles: Vec<String>,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Public leaderboard for a guild.
    Leaderboard {
        #[arg(long)]
        guild: String,

        /// all, day, week, or month.
        #[arg(long, default_value = "all")]
        range: Range,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Set the channel that receives audit notifications (administrators only).
    SetNotifyChannel {
        #[arg(long)]
        guild: String,

        #[arg(long)]
        channel: String,

        /// Caller holds the administrator capability (resolved upstream).
        #[arg(long)]
        admin: bool,
    },

    /// Set the role that grants the manager capability (administrators only).
    SetManagerRole {
        #[arg(long)]
        guild: String,

        #[arg(long)]
        role: String,

        /// Caller holds the administrator capability (resolved upstream).
        #[arg(long)]
        admin: bool,
    },
}
