use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ponto_cli::commands::{employees, export, history, import, register, status, util};
use ponto_cli::{Cli, Commands, Config};
use ponto_core::{CivilClock, Clock, FixedClock, Registrar, SystemClock};
use ponto_db::Database;

/// Load config, ensuring the database's parent directory exists.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if config.tolerance().is_disabled() {
        tracing::warn!("tolerance_minutes is 0; registration windows are a single instant");
    }

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Ok(config)
}

fn open_database(config: &Config) -> Result<Database> {
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Wire the clock, ledger and tolerance together.
///
/// `at` pins the clock; registration only ever passes the debug-build test
/// clock here.
fn registrar(
    config: &Config,
    at: Option<DateTime<Utc>>,
) -> Result<Registrar<Arc<dyn Clock>, Database>> {
    let zone = config.zone().context("invalid timezone configuration")?;
    let clock: Arc<dyn Clock> = match at {
        Some(at) => {
            tracing::debug!(%at, "using fixed clock");
            Arc::new(FixedClock::new(at))
        }
        None => Arc::new(SystemClock),
    };
    Ok(Registrar::new(
        CivilClock::new(clock, zone),
        open_database(config)?,
        config.tolerance(),
    ))
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
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Status(args)) => {
            let config = load_config(cli.config.as_deref())?;
            let session = args.login.login(&config.roster())?;
            let at = match args.at {
                Some(at) => Some(at),
                None => util::test_clock()?,
            };
            status::run(&mut stdout, &registrar(&config, at)?, &session, args.json)?;
        }
        Some(Commands::Register(args)) => {
            let config = load_config(cli.config.as_deref())?;
            let session = args.login.login(&config.roster())?;
            let registrar = registrar(&config, util::test_clock()?)?;
            register::run(&mut stdout, &registrar, &session)?;
        }
        Some(Commands::History(args)) => {
            let config = load_config(cli.config.as_deref())?;
            let session = args.login.login(&config.roster())?;
            let registrar = registrar(&config, None)?;
            history::run(&mut stdout, &registrar, &session, args.json)?;
        }
        Some(Commands::Employees(args)) => {
            let config = load_config(cli.config.as_deref())?;
            employees::run(&mut stdout, &config.roster(), args)?;
        }
        Some(Commands::Export) => {
            let config = load_config(cli.config.as_deref())?;
            export::run(&mut stdout, &open_database(&config)?)?;
        }
        Some(Commands::Import) => {
            let config = load_config(cli.config.as_deref())?;
            let mut db = open_database(&config)?;
            let inserted = import::run(io::stdin().lock(), &mut db)?;
            eprintln!("Imported {inserted} new stamps");
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
