//! # UMB Station
//!
//! Polls a Lufft weather station over UMB and records its measurements.
//!
//! On every poll interval the configured channels are queried, the values
//! are logged and, when telemetry is enabled, appended to rotating JSONL
//! files.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use umb_station::client::UmbClient;
use umb_station::config::Config;
use umb_station::poller::{Poller, WeatherRecord};
use umb_station::serial::SerialLink;
use umb_station::telemetry::TelemetryLogger;

/// Configuration file used when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Parser, Debug)]
#[command(name = "umb-station", version, about = "Poll a UMB weather station")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Run a single poll cycle and exit.
    #[arg(long)]
    once: bool,
}

/// Main entry point
///
/// # Control Flow
///
/// 1. Load configuration and set up logging
/// 2. Open the serial link, retrying while the adapter is absent
/// 3. Poll the station every `poll_interval_s` seconds until Ctrl+C
///
/// # Errors
///
/// Returns error if the configuration is invalid, the serial port cannot be
/// opened or the telemetry directory cannot be created. Failed channel
/// queries are logged and never end the loop.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("UMB Station v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config))?;

    let link = SerialLink::from_config(&config.serial).await?;
    info!("UMB serial port opened at: {}", link.device_path());

    let mut client = UmbClient::new(link, config.serial.idle_timeout());
    let mut poller = Poller::new(&config.station);

    let mut telemetry = if config.telemetry.enabled {
        Some(TelemetryLogger::new(&config.telemetry)?)
    } else {
        None
    };

    if cli.once {
        let record = poller.poll_cycle(&mut client).await;
        report(&record, telemetry.as_mut());
        return Ok(());
    }

    let mut poll_interval = interval(Duration::from_secs(config.station.poll_interval_s));
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Polling station {} every {}s ({} channels)",
        config.station.receiver_id,
        config.station.poll_interval_s,
        config.station.channels.len()
    );
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = poll_interval.tick() => {
                let record = poller.poll_cycle(&mut client).await;
                report(&record, telemetry.as_mut());
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Completed poll cycles: {}", poller.cycle());
                break;
            }
        }
    }

    Ok(())
}

/// Log a record and hand it to the telemetry writer
fn report(record: &WeatherRecord, telemetry: Option<&mut TelemetryLogger>) {
    if record.readings.is_empty() {
        warn!("No readings at {}", record.timestamp);
        return;
    }

    info!("{}: {}", record.timestamp, summary(record));

    if let Some(logger) = telemetry {
        if let Err(e) = logger.log(record) {
            warn!("Failed to persist record: {}", e);
        }
    }
}

/// `name=value` pairs in name order
fn summary(record: &WeatherRecord) -> String {
    record
        .readings
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}
