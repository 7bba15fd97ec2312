use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use att_cli::commands::{checkin, checkout, report, settings, status};
use att_cli::{Cli, Commands, Config, LogNotifier};
use att_core::{Calendar, Clock, SessionEngine, SessionStore, SystemClock};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(att_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = att_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let Some(command) = cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (db, config) = open_database(cli.config.as_deref())?;
    let calendar = Calendar::parse(&config.utc_offset)
        .with_context(|| format!("invalid utc_offset in configuration: {}", config.utc_offset))?;
    let engine = SessionEngine::new(&db, SystemClock, calendar);
    let notifier = LogNotifier;
    let mut stdout = std::io::stdout();

    match &command {
        Commands::CheckIn { guild, member } => {
            checkin::run(&mut stdout, &engine, &notifier, guild, member)?;
        }
        Commands::CheckOut { guild, member } => {
            checkout::run(&mut stdout, &engine, &notifier, guild, member)?;
        }
        Commands::Status { guild, member } => {
            status::run(&mut stdout, &engine, guild, member)?;
        }
        Commands::Report {
            guild,
            range,
            admin,
            roles,
            json,
        } => {
            let is_manager = db.settings(guild)?.is_manager(*admin, roles);
            report::report(
                &mut stdout,
                &db,
                calendar,
                SystemClock.now(),
                guild,
                *range,
                is_manager,
                config.display_limit,
                *json,
            )?;
        }
        Commands::Leaderboard { guild, range, json } => {
            report::show_leaderboard(
                &mut stdout,
                &db,
                calendar,
                SystemClock.now(),
                guild,
                *range,
                config.display_limit,
                *json,
            )?;
        }
        Commands::SetNotifyChannel {
            guild,
            channel,
            admin,
        } => {
            settings::set_notify_channel(&mut stdout, &db, guild, channel, *admin)?;
        }
        Commands::SetManagerRole { guild, role, admin } => {
            settings::set_manager_role(&mut stdout, &db, guild, role, *admin)?;
        }
    }

    Ok(())
}
