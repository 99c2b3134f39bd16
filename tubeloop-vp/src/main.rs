//! Video Player (tubeloop-vp) - Main entry point
//!
//! Playback orchestrator for the tubeloop kiosk: serves the kiosk page,
//! drives the embedded player through an SSE command stream, and pulls
//! its playlist from the program director one item at a time.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubeloop_common::clock::SystemClock;
use tubeloop_vp::api::{self, AppContext};
use tubeloop_vp::{
    BridgePlayer, KioskBroadcaster, Orchestrator, OrchestratorSettings, PdClient,
};

/// Command-line arguments for tubeloop-vp
#[derive(Parser, Debug)]
#[command(name = "tubeloop-vp")]
#[command(about = "Video Player service for the tubeloop kiosk")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "TUBELOOP_VP_PORT", default_value = "5751")]
    port: u16,

    /// Base URL of the program director
    #[arg(
        long,
        env = "TUBELOOP_PD_URL",
        default_value = "http://127.0.0.1:5750"
    )]
    pd_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubeloop_vp=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("program director at {}", args.pd_url);

    let broadcaster = KioskBroadcaster::new(100);
    let bridge = Arc::new(BridgePlayer::new(broadcaster.clone()));
    let selection = Arc::new(PdClient::new(args.pd_url));

    let (orchestrator, handle) = Orchestrator::new(
        Arc::clone(&bridge) as Arc<dyn tubeloop_vp::EmbedPlayer>,
        selection,
        broadcaster.clone(),
        Arc::new(SystemClock),
        OrchestratorSettings::default(),
    );
    let loop_task = tokio::spawn(orchestrator.run());
    handle.begin();

    let ctx = AppContext {
        handle: handle.clone(),
        bridge,
        broadcaster,
    };
    api::run(ctx, args.port).await.context("Server error")?;

    handle.shutdown();
    let _ = loop_task.await;
    Ok(())
}
