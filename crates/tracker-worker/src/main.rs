//! Board state tracker worker
//!
//! Polls a visual chess board surface (via the element dump a host-page
//! companion script emits), reconstructs the authoritative game state, and
//! publishes it as NDJSON whenever the position actually changes.

mod config;
mod error;
mod publish;
mod surface;
mod tracker;

use std::time::Duration;

use tracing::info;

use crate::config::WorkerConfig;
use crate::publish::NdjsonPublisher;
use crate::surface::JsonSurface;
use crate::tracker::Tracker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let config = WorkerConfig::load()?;
    info!(
        surface_dump_path = %config.surface_dump_path,
        poll_interval_ms = config.poll_interval_ms,
        "Worker config loaded"
    );

    let surface = JsonSurface::new(&config)?;
    // Published state goes to stdout; logs stay on stderr.
    let publisher = NdjsonPublisher::new(std::io::stdout());

    let (handle, join) = Tracker::new(surface, publisher)
        .spawn(Duration::from_millis(config.poll_interval_ms));
    handle.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");
    handle.shutdown().await;
    join.await?;

    Ok(())
}
