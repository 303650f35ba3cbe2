//! Core error types for sshpool

use std::path::PathBuf;
use thiserror::Error;

use crate::record::ErrorRecord;

/// Top-level error type for the sshpool ecosystem
#[derive(Error, Debug)]
pub enum PoolError {
    /// Malformed connection descriptor
    #[error("Descriptor error: {0}")]
    Dsn(#[from] DsnError),

    /// Handshake failure
    #[error("Connection error: {0}")]
    Connect(#[from] ConnectError),

    /// Failure while a command was in flight
    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    /// Registry lookup failure
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connection descriptor parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DsnError {
    /// Not a well-formed `alias://...` URI
    #[error("malformed descriptor {input:?}: {reason}")]
    Malformed { input: String, reason: String },

    /// The scheme (alias) is empty
    #[error("descriptor {0:?} has an empty alias")]
    EmptyAlias(String),

    /// No hostname present
    #[error("descriptor {0:?} has no hostname")]
    MissingHost(String),
}

/// Handshake-time failures reported by a [`Connector`](crate::Connector)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// Hostname cannot be resolved
    #[error("host {host} is not known: {reason}")]
    HostResolution { host: String, reason: String },

    /// The remote host accepts none of the credential types offered
    #[error("unsupported authentication type, supported types are {}", .allowed.join(","))]
    UnsupportedAuth { allowed: Vec<String> },

    /// Credentials rejected
    #[error("authentication failed for {username}")]
    Authentication { username: String },

    /// Any other handshake failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// A transport failure while a command was executing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Caller-visible failure of a send/recv exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// The execution unit has exited and accepts no more commands
    #[error("channel {0} is terminated")]
    Terminated(String),

    /// The execution unit reported an error record
    #[error("{0}")]
    Remote(ErrorRecord),
}

impl ExecError {
    /// Wire form used by the control surface
    pub fn record(&self) -> ErrorRecord {
        match self {
            ExecError::Terminated(alias) => ErrorRecord::terminated(alias),
            ExecError::Remote(record) => record.clone(),
        }
    }
}

impl From<ErrorRecord> for ExecError {
    fn from(record: ErrorRecord) -> Self {
        ExecError::Remote(record)
    }
}

/// Registry-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No channel registered under the alias
    #[error("channel not found: {0}")]
    NotFound(String),

    /// Descriptor rejected at creation time
    #[error(transparent)]
    Dsn(#[from] DsnError),

    /// Handshake failed at creation time
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
