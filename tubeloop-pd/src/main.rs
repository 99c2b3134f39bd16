//! Program Director (tubeloop-pd) - Main entry point
//!
//! Video selection service for the tubeloop kiosk: serves `GET /api/next`
//! and `POST /api/played` to the video player, backed by the YouTube Data
//! API with RSS and cached fallbacks.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubeloop_common::clock::SystemClock;
use tubeloop_common::config::KioskConfig;
use tubeloop_common::storage::{self, Store, CONFIG_DOC};
use tubeloop_pd::api::server::{self, AppContext};
use tubeloop_pd::providers::{CandidateProvider, ProviderChain, RssProvider, YouTubeApiProvider};
use tubeloop_pd::selector::engine::SelectionEngine;

/// Command-line arguments for tubeloop-pd
#[derive(Parser, Debug)]
#[command(name = "tubeloop-pd")]
#[command(about = "Program Director service for the tubeloop kiosk")]
#[command(version)]
struct Args {
    /// Port to listen on (defaults to the configured document value)
    #[arg(short, long, env = "TUBELOOP_PD_PORT")]
    port: Option<u16>,

    /// Data directory holding config.json, played.json, and the cache
    #[arg(short, long, env = "TUBELOOP_DATA")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubeloop_pd=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let data_dir = args.data_dir.unwrap_or_else(storage::default_data_dir);
    let store = Store::open(&data_dir).context("Failed to open data directory")?;
    info!("Data directory: {}", data_dir.display());

    let config: KioskConfig = store.read_or_default(CONFIG_DOC);
    let port = args.port.unwrap_or(config.port);
    if config.channels.is_empty() {
        info!("No channels configured yet; /api/next will fail until an operator adds some");
    } else {
        info!("Configured channels: {}", config.channels.len());
    }

    let chain = ProviderChain::new(vec![
        Arc::new(YouTubeApiProvider::new(store.clone())) as Arc<dyn CandidateProvider>,
        Arc::new(RssProvider::new()),
    ]);
    let engine = Arc::new(SelectionEngine::new(
        store.clone(),
        chain,
        Arc::new(SystemClock),
    ));

    let ctx = AppContext { engine, store };
    server::run(ctx, port).await.context("Server error")?;

    Ok(())
}
