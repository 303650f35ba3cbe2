//! sshpool control client
//!
//! One-shot subcommands against a running daemon, or an interactive shell
//! when no subcommand is given.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sshpool_core::config::{self, ConfigFile, CtlConfig};
use sshpool_ctl::commands::{run_command, start_command, status_command, stop_command};
use sshpool_ctl::output::print_warning;
use sshpool_ctl::shell::run_shell;
use sshpool_ctl::PoolClient;

#[derive(Parser)]
#[command(name = "sshpoolctl")]
#[command(author, version, about = "Control client for the sshpool daemon")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Daemon address, host:port or URL (overrides config)
    #[arg(short, long, global = true, env = "SSHPOOL_SERVER")]
    server: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show channels and whether their sessions are running
    Status {
        /// Only show this channel
        alias: Option<String>,
    },

    /// Register a channel, e.g. web://deploy@web1.example.com:22
    Start {
        /// Connection descriptor alias://[user[:password]@]host[:port]
        dsn: String,
    },

    /// Run a command on a channel
    Run {
        /// Channel alias
        alias: String,
        /// Command line to run remotely
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Close a channel and remove it
    Stop {
        /// Channel alias
        alias: String,
    },

    /// Interactive shell (default)
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut ctl = load_ctl_config(cli.config.as_ref())?;
    if let Some(server) = cli.server {
        ctl.server = server;
    }
    let client = PoolClient::new(ctl.base_url());

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Status { alias } => status_command(&client, alias.as_deref()).await,
        Commands::Start { dsn } => start_command(&client, &dsn).await,
        Commands::Run { alias, command } => {
            let exit_code = run_command(&client, &alias, &command.join(" ")).await?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
        Commands::Stop { alias } => stop_command(&client, &alias).await,
        Commands::Shell => run_shell(&client).await,
    }
}

fn load_ctl_config(path: Option<&PathBuf>) -> Result<CtlConfig> {
    if let Some(path) = path {
        let file: ConfigFile = config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?;
        return Ok(file.ctl);
    }

    let default_path = config::default_config_path();
    if !default_path.exists() {
        return Ok(CtlConfig::default());
    }
    match config::load_config::<ConfigFile>(&default_path) {
        Ok(file) => Ok(file.ctl),
        Err(e) => {
            print_warning(&format!("Ignoring config {:?}: {}", default_path, e));
            Ok(CtlConfig::default())
        }
    }
}
