//! Attendance tracker CLI library.
//!
//! This crate is the frontend for the attendance engine: argument parsing,
//! configuration, and rendering of engine results. Authorization inputs and
//! notification delivery cross this boundary as plain data; the engine and
//! stores live in `att-core` and `att-db`.

mod cli;
pub mod commands;
mod config;
mod notify;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use notify::LogNotifier;
