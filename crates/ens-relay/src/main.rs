//! ensemble relay daemon
//!
//! Accepts WebSocket connections from playback clients and coordinates
//! master election, track assignment, and synchronized playback.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ens_core::config::{self, RelayConfig};
use ens_core::time::SystemClock;
use ens_relay::RelayServer;

#[derive(Parser)]
#[command(name = "ens-relay")]
#[command(about = "ensemble relay daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Master election secret (overrides config)
    #[arg(long, env = "ENS_MASTER_SECRET")]
    master_secret: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("ensemble relay starting...");

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                RelayConfig::default()
            })
        } else {
            tracing::info!("Using default configuration");
            RelayConfig::default()
        }
    };

    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(secret) = args.master_secret {
        config.master_secret = secret;
    }

    if config.master_secret.is_empty() {
        tracing::warn!("Master secret is empty - any client can claim the master role");
    }
    if !config.audio_dir.exists() {
        tracing::warn!(
            "Audio directory {:?} does not exist - /audio/ requests will 404",
            config.audio_dir
        );
    }

    let handle = RelayServer::start(config, Arc::new(SystemClock)).await?;
    tracing::info!("Relay ready on {}", handle.local_addr());

    // Wait for a shutdown signal
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown...");
        }
    }

    handle.shutdown();
    tracing::info!("Relay shutdown complete");
    Ok(())
}
