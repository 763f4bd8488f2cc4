//! Valentine relay - visit-notification backend for a small personal site
//!
//! Serves the site's static files, answers liveness probes, and relays each
//! page visit to the owner's Telegram chat.
//!
//! Module structure:
//! - `domain/` - Visit records, user-agent enrichment, message rendering
//! - `io/` - External interfaces (HTTP server, Telegram sink)
//! - `services/` - Visit relay orchestration
//! - `infra/` - Infrastructure (Config, logging)
//! - `game/` - The site's catching mini-game as a host-driven state machine

use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use valentine_relay::infra::{init_logging, Config};
use valentine_relay::io::{start_http_server, AppContext};

/// Valentine relay - visit logging and Telegram notifications
#[derive(Parser, Debug)]
#[command(name = "valentine-relay", version, about)]
struct Args {
    /// Path to TOML configuration file [default: $CONFIG_FILE, then config/dev.toml]
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!(git_hash = %env!("GIT_HASH"), "valentine-relay starting");

    // Parse command line arguments using clap
    let args = Args::parse();

    // Load configuration from TOML file, then environment overrides
    let config = Config::load(args.config.as_deref());

    info!(
        config_file = %config.config_file(),
        bind_address = %config.bind_address(),
        port = %config.port(),
        public_dir = %config.public_dir().display(),
        trust_forwarded_for = %config.trust_forwarded_for(),
        utc_offset_minutes = %config.utc_offset_minutes(),
        telegram_configured = %config.telegram_credentials().is_some(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Relay and sink are built once and shared by every request
    let ctx = Arc::new(AppContext::from_config(&config));

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    start_http_server(&config, ctx, shutdown_rx).await?;

    info!("valentine-relay shutdown complete");
    Ok(())
}
