use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use xing_cli::commands::{events, predict, record, runtime, stats, status, sync};
use xing_cli::{Cli, Commands, Config};
use xing_core::time;
use xing_store::EventStore;
use xing_sync::{Ledger, SyncEngine, Tracker};

/// Load config and open the local store, ensuring the parent directory exists.
fn open_store(config_path: Option<&Path>) -> Result<(EventStore, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.data_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    Ok((EventStore::open(&config.data_path), config))
}

fn engine(config: &Config) -> Result<SyncEngine<Ledger>> {
    let ledger = config.ledger().context("failed to configure remote ledger")?;
    if ledger.is_offline() {
        tracing::debug!("no remote ledger configured, running offline");
    }
    Ok(SyncEngine::new(ledger).with_fetch_limit(config.fetch_limit))
}

fn open_tracker(config_path: Option<&Path>) -> Result<(Tracker<Ledger>, Config)> {
    let (store, config) = open_store(config_path)?;
    let tracker = Tracker::new(store, engine(&config)?, config.origin.clone());
    Ok((tracker, config))
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

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Record { status }) => {
            let (mut tracker, _config) = open_tracker(cli.config.as_deref())?;
            runtime()?.block_on(record::run(&mut out, &mut tracker, *status))?;
        }
        Some(Commands::Status { remote }) => {
            let (store, config) = open_store(cli.config.as_deref())?;
            let engine = if *remote { Some(engine(&config)?) } else { None };
            runtime()?.block_on(status::run(&mut out, &store, engine.as_ref()))?;
        }
        Some(Commands::Sync { watch }) => {
            let (mut tracker, config) = open_tracker(cli.config.as_deref())?;
            let runtime = runtime()?;
            if *watch {
                runtime.block_on(sync::watch(&mut out, &mut tracker, config.sync_interval()))?;
            } else {
                runtime.block_on(sync::run(&mut out, &mut tracker))?;
            }
        }
        Some(Commands::Predict { in_minutes, json }) => {
            let (store, config) = open_store(cli.config.as_deref())?;
            predict::run(
                &mut out,
                store.log(),
                time::now(),
                *in_minutes,
                &config.prediction,
                *json,
            )?;
        }
        Some(Commands::Stats { days, json }) => {
            let (store, config) = open_store(cli.config.as_deref())?;
            let window_days = days.unwrap_or(config.statistics.window_days);
            stats::run(&mut out, store.log(), time::now(), window_days, *json)?;
        }
        Some(Commands::Events { limit }) => {
            let (store, _config) = open_store(cli.config.as_deref())?;
            events::run(&mut out, store.log(), *limit)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    out.flush()?;
    Ok(())
}
