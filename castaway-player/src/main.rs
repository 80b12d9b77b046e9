//! Castaway Player - Main entry point
//!
//! Runs the playback coordinator against the loopback engine and a SQLite
//! catalog, and serves the HTTP/SSE API until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use castaway_common::config::{resolve_config_path, CONFIG_ENV_VAR};
use castaway_player::api::{self, AppContext};
use castaway_player::catalog::SqliteCatalog;
use castaway_player::config::{CliOverrides, TomlConfig};
use castaway_player::engine::LoopbackEngine;
use castaway_player::playback::PlaybackCoordinator;
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for castaway-player
#[derive(Parser, Debug)]
#[command(name = "castaway-player")]
#[command(about = "Podcast playback state coordinator")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "CASTAWAY_PORT")]
    port: Option<u16>,

    /// Catalog database path (overrides config)
    #[arg(short, long, env = "CASTAWAY_DATABASE")]
    database: Option<PathBuf>,

    /// Feed to load on connect: local JSON export or file:// URL (overrides config)
    #[arg(short, long, env = "CASTAWAY_FEED_URL")]
    feed_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let config = TomlConfig::load(
        config_path.as_deref(),
        CliOverrides {
            port: args.port,
            database_path: args.database,
            feed_url: args.feed_url,
        },
    )
    .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "castaway_player={0},castaway_common={0},tower_http=info",
                    config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Castaway Player on port {}", config.port);
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using defaults"),
    }

    let catalog = Arc::new(
        SqliteCatalog::open(&config.database_path)
            .await
            .context("Failed to open catalog database")?,
    );
    let engine = Arc::new(LoopbackEngine::new(config.loopback()));

    let coordinator = Arc::new(
        PlaybackCoordinator::new(engine, catalog, config.coordinator())
            .context("Failed to create playback coordinator")?,
    );
    coordinator
        .subscribe()
        .await
        .context("Failed to subscribe to playback engine")?;
    info!("Playback coordinator subscribed");

    let ctx = AppContext {
        coordinator: coordinator.clone(),
        port: config.port,
    };
    api::run(ctx, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    coordinator.unsubscribe().await;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
