//! sshpool daemon
//!
//! Keeps a pool of named SSH channels open and serves them over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sshpool_core::config::{self, ConfigFile};
use sshpool_daemon::http;
use sshpool_daemon::transport::RusshConnector;
use sshpool_daemon::DaemonState;

#[derive(Parser)]
#[command(name = "sshpoold")]
#[command(about = "sshpool daemon - named, long-lived SSH channels behind an HTTP API")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind the HTTP server to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind the HTTP server to (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Channel descriptor to register at boot, e.g. web://deploy@web1:22
    #[arg(long = "channel", value_name = "DSN")]
    channels: Vec<String>,

    /// File of newline-separated descriptors to register at boot
    #[arg(long, value_name = "PATH")]
    channels_file: Option<PathBuf>,

    /// Run in foreground with verbose output
    #[arg(short, long)]
    foreground: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.foreground { "debug" } else { &args.log_level };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("sshpool daemon starting...");

    let file: ConfigFile = if let Some(config_path) = &args.config {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                ConfigFile::default()
            })
        } else {
            tracing::info!("Using default configuration");
            ConfigFile::default()
        }
    };

    let mut daemon = file.daemon;
    daemon.override_bind(args.host.as_deref(), args.port);

    let mut descriptors = daemon.channels.clone();
    descriptors.extend(args.channels.iter().cloned());
    if let Some(path) = args.channels_file.as_ref().or(daemon.channels_file.as_ref()) {
        let from_file = config::load_descriptor_file(path)
            .with_context(|| format!("Failed to read channels file {:?}", path))?;
        tracing::info!("Loaded {} descriptors from {:?}", from_file.len(), path);
        descriptors.extend(from_file);
    }

    let bind_addr = daemon.bind_address.clone();
    let connector = Arc::new(RusshConnector::new(&daemon));
    let state = DaemonState::new(daemon, connector);

    let registered = state.preregister(descriptors.iter().map(String::as_str));
    tracing::info!("Registered {} of {} channels", registered, descriptors.len());

    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
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

        cancel_clone.cancel();
    });

    let served = http::serve(&bind_addr, state.clone(), cancel.clone())
        .await
        .with_context(|| format!("HTTP server on {} failed", bind_addr));

    // Channels are closed even when the server could not start
    state.registry.shutdown().await;

    served?;
    tracing::info!("sshpool daemon shutdown complete");
    Ok(())
}
