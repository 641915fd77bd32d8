//! # Vayu Runner
//!
//! Hub orchestration: configuration loading, the CLI, the ingest
//! pipeline task, and the viewer-facing web server.
//!
//! ## Commands
//! - `serve` - Run the hub (ingest, persist, fan out)
//! - `history` - One-shot query of the telemetry store

pub mod config;
pub mod pipeline;
pub mod web_server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

pub use config::HubConfig;
pub use pipeline::IngestPipeline;
pub use web_server::{start_server, HubState};

use vayu_core::ReadingWindow;
use vayu_models::{HistoryRange, RowLimit};
use vayu_store::TelemetryStore;

#[derive(Parser, Debug)]
#[command(name = "vayu-hub")]
#[command(about = "Vayu - MQTT sensor telemetry hub")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the hub: ingest readings, persist them, fan out to viewers
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/hub.toml")]
        config: PathBuf,
    },

    /// One-shot history query against the telemetry store
    History {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/hub.toml")]
        config: PathBuf,

        /// Range token: lasthour | today | 7days | 30days
        #[arg(long, default_value = "lasthour")]
        range: String,

        /// Row limit token: 30 | 60 | 90 | all
        #[arg(long, default_value = "30")]
        limit: String,
    },
}

/// Main entry point for the hub binary.
pub fn run() -> anyhow::Result<()> {
    let rt = create_runtime()?;
    rt.block_on(async_main())
}

/// Create the shared tokio runtime.
fn create_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create runtime: {}", e))
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guards = vayu_core::observability::init_tracing("vayu-hub");

    match cli.command {
        Commands::Serve { config } => run_serve(&config).await,
        Commands::History {
            config,
            range,
            limit,
        } => run_history(&config, &range, &limit).await,
    }
}

async fn run_serve(config_path: &Path) -> anyhow::Result<()> {
    let config = HubConfig::load(config_path)?;

    let store = Arc::new(
        TelemetryStore::open(&config.storage.path).context("opening telemetry store")?,
    );
    let window = Arc::new(ReadingWindow::new(config.window.capacity));

    let (source, publisher) = vayu_connectors_mqtt::connect(&config.broker_settings());
    info!(
        broker = %config.broker.host,
        sensor_topic = %config.broker.sensor_topic,
        window_capacity = config.window.capacity,
        "hub starting"
    );

    let state = Arc::new(HubState::new(
        Arc::clone(&window),
        Arc::clone(&store),
        publisher,
        config.history.default_limit,
    ));

    let ingest = IngestPipeline::new(window, store, state.events.clone());
    tokio::spawn(ingest.run(source));

    start_server(state, &config.server.bind, config.server.port).await
}

async fn run_history(config_path: &Path, range: &str, limit: &str) -> anyhow::Result<()> {
    let config = HubConfig::load(config_path)?;
    let store =
        TelemetryStore::open(&config.storage.path).context("opening telemetry store")?;

    let rows = store.query(HistoryRange::parse(range), RowLimit::parse(limit))?;
    for row in rows {
        println!("{}", serde_json::to_string(&row)?);
    }

    Ok(())
}
