//! sshpool-ctl: Command-line client for the sshpool daemon
//!
//! Provides the `sshpoolctl` binary: one-shot subcommands plus an
//! interactive shell, both talking to the daemon's HTTP API.

pub mod client;
pub mod commands;
pub mod output;
pub mod shell;

pub use client::{ClientError, PoolClient};
