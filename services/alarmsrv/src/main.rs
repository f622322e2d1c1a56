//! Alarm Service (AlarmSrv)
//!
//! Restores persisted alarms, replays event batches through the alarm engine
//! and runs the notification cycle until the replay is drained.

use alarmsrv::{logging, replay, AlarmService, AlarmSrvConfig, AutoAckNotifier};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use voltage_alarms::{MemoryAlarmCache, SharedAlarmCache};

#[derive(Debug, Parser)]
#[command(name = "alarmsrv", version, about = "Voltage EMS alarm aggregation service")]
struct Args {
    /// Configuration file (YAML)
    #[arg(short, long, env = "ALARMSRV_CONFIG")]
    config: Option<PathBuf>,

    /// Event batches to replay (JSON)
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Log level override
    #[arg(long)]
    log_level: Option<String>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", AlarmSrvConfig::generate_default_config());
        return Ok(());
    }

    let config = AlarmSrvConfig::load(args.config.as_deref())?;
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.service.log_level);
    if let Err(e) = logging::init(level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting {}...", config.service.name);

    let initial = match &config.storage.initial_alarms {
        Some(path) => replay::load_initial_alarms(path)?,
        None => Vec::new(),
    };
    let cache = MemoryAlarmCache::from_alarms(initial).context("Invalid initial alarm set")?;

    let batches = match &args.events {
        Some(path) => replay::load_event_batches(path)?,
        None => Vec::new(),
    };

    let service = AlarmService::new(
        SharedAlarmCache::new(cache),
        Arc::new(AutoAckNotifier::new()),
        config.cycle.clone(),
    );

    if let Err(e) = service.run(batches).await {
        error!("{} stopped: {:#}", config.service.name, e);
        return Err(e);
    }

    info!("{} finished", config.service.name);
    Ok(())
}
