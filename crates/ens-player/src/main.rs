//! ensemble player client
//!
//! Connects to a relay, plays its assigned track at the shared start
//! time, and optionally takes the master role to drive the session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ens_core::config::{self, PlayerConfig};
use ens_core::time::SystemClock;
use ens_player::engine::SilentEngine;
use ens_player::session::PlayerSession;
use ens_player::source::HttpTrackSource;

#[derive(Parser)]
#[command(name = "ens-player")]
#[command(about = "ensemble player client")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Relay base URL (overrides config)
    #[arg(short, long)]
    server: Option<String>,

    /// Attempt master election with this secret after connecting
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

    tracing::info!("ensemble player starting...");

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                PlayerConfig::default()
            })
        } else {
            PlayerConfig::default()
        }
    };

    if let Some(server) = args.server {
        config.server_url = server;
    }
    if args.master_secret.is_some() {
        config.master_secret = args.master_secret;
    }

    let source = HttpTrackSource::new(&config.server_url)?;
    let session = PlayerSession::new(SilentEngine::new(), source, Arc::new(SystemClock));

    tokio::select! {
        result = ens_player::client::run(&config, session) => {
            result.context("Player session ended with error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, disconnecting");
        }
    }

    tracing::info!("Player shutdown complete");
    Ok(())
}
