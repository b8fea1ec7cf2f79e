//! CLI entry point for the ride dispatch engine.
//!
//! Provides subcommands for running a single search cycle against on-disk
//! JSON documents and for the offline metrics repair tool.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ride_dispatch::config::DispatchConfig;
use ride_dispatch::dispatch::DispatchEngine;
use ride_dispatch::models::{Driver, RideRequest};
use ride_dispatch::push::{HttpPushSender, LoggingPushSender, PushSender};
use ride_dispatch::repair::MetricsRepair;
use ride_dispatch::store::{InMemoryDriverStore, InMemoryRequestStore, RideRequestRepository};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ride_dispatch")]
#[command(about = "Driver ranking and dispatch engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search cycle for a ride request against a driver registry
    Dispatch {
        /// JSON file with the driver registry (array of driver documents)
        #[arg(short, long, default_value = "drivers.json")]
        drivers: String,

        /// JSON file with the ride request document
        #[arg(short, long)]
        request: String,

        /// Optional JSON config file (radius, weights, tier thresholds)
        #[arg(short, long)]
        config: Option<String>,

        /// Push gateway URL; deliveries are logged only when omitted
        #[arg(long)]
        push_endpoint: Option<String>,
    },
    /// Rewrite stale metrics windows, preserving counts
    Repair {
        /// JSON file with the driver registry; corrected in place
        #[arg(short, long, default_value = "drivers.json")]
        drivers: String,

        /// Repair a single driver instead of the whole registry
        #[arg(long)]
        driver_id: Option<String>,
    },
    /// Report whether a driver's metrics windows need repair
    Check {
        /// JSON file with the driver registry
        #[arg(short, long, default_value = "drivers.json")]
        drivers: String,

        #[arg(long)]
        driver_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ride_dispatch.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ride_dispatch.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dispatch {
            drivers,
            request,
            config,
            push_endpoint,
        } => {
            run_dispatch(&drivers, &request, config.as_deref(), push_endpoint).await?;
        }
        Commands::Repair { drivers, driver_id } => {
            run_repair(&drivers, driver_id.as_deref()).await?;
        }
        Commands::Check { drivers, driver_id } => {
            let store = load_drivers(&drivers).await?;
            let repair = MetricsRepair::new(store);
            let stale = repair.needs_repair(&driver_id).await?;
            println!("{}", if stale { "needs repair" } else { "ok" });
        }
    }

    Ok(())
}

/// Runs a single search cycle as if a "request created" trigger fired,
/// then writes the updated request document back and prints it.
async fn run_dispatch(
    drivers_path: &str,
    request_path: &str,
    config_path: Option<&str>,
    push_endpoint: Option<String>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => DispatchConfig::load(path)?,
        None => DispatchConfig::default(),
    };

    let driver_store = load_drivers(drivers_path).await?;
    let request: RideRequest = read_json(request_path)?;
    let request_store = Arc::new(InMemoryRequestStore::new());
    request_store.insert(request.clone()).await;

    let push: Arc<dyn PushSender> = match push_endpoint {
        Some(endpoint) => Arc::new(HttpPushSender::new(endpoint)?),
        None => Arc::new(LoggingPushSender),
    };

    let engine = DispatchEngine::new(driver_store, request_store.clone(), push, config);
    engine.handle_request_created(&request).await;

    let updated = request_store
        .get(&request.id)
        .await?
        .context("request disappeared from store")?;
    std::fs::write(request_path, serde_json::to_string_pretty(&updated)?)?;
    println!("{}", serde_json::to_string_pretty(&updated)?);

    Ok(())
}

/// Repairs one driver or sweeps the whole registry, writing the corrected
/// documents back to the registry file.
async fn run_repair(drivers_path: &str, driver_id: Option<&str>) -> Result<()> {
    let store = load_drivers(drivers_path).await?;
    let repair = MetricsRepair::new(store.clone());

    match driver_id {
        Some(id) => {
            let outcome = repair.fix_one(id).await?;
            info!(driver_id = id, ?outcome, "repair finished");
        }
        None => {
            let summary = repair.fix_all().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    let corrected = store.snapshot().await;
    std::fs::write(drivers_path, serde_json::to_string_pretty(&corrected)?)?;

    Ok(())
}

async fn load_drivers(path: &str) -> Result<Arc<InMemoryDriverStore>> {
    let drivers: Vec<Driver> = read_json(path)?;
    info!(path, count = drivers.len(), "driver registry loaded");

    let store = Arc::new(InMemoryDriverStore::new());
    for driver in drivers {
        store.insert(driver).await;
    }
    Ok(store)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read '{path}'"))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in '{path}'"))
}
