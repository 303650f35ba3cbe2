//! Records exchanged across the execution-unit boundary
//!
//! A channel's execution unit cannot hand typed errors back to its caller,
//! so every reply is either a [`CommandOutput`] or a tagged [`ErrorRecord`].
//! The same records, in their text form, are what the HTTP control surface
//! serializes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ConnectError, TransportError};

/// What one `recv` yields
pub type Reply = Result<CommandOutput, ErrorRecord>;

/// Output of one remote command, kept as raw bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Bytes,
    pub stderr: Bytes,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<Bytes>, stderr: impl Into<Bytes>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Decode both streams as (lossy) UTF-8 for the text wire format
    pub fn to_text(&self) -> TextOutput {
        TextOutput {
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            exit_code: self.exit_code,
        }
    }
}

/// Wire form of [`CommandOutput`]: `{stdout, stderr, exitCode}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Classification carried by an [`ErrorRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    HostResolution,
    UnsupportedAuth,
    Authentication,
    Transport,
    ConnectionDropped,
    Interrupted,
    Terminated,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::HostResolution => "host_resolution",
            ErrorKind::UnsupportedAuth => "unsupported_auth",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Transport => "transport",
            ErrorKind::ConnectionDropped => "connection_dropped",
            ErrorKind::Interrupted => "interrupted",
            ErrorKind::Terminated => "terminated",
        };
        write!(f, "{}", s)
    }
}

/// Tagged error pushed over a channel's link when its execution unit stops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub exception: String,
}

impl ErrorRecord {
    pub fn new(kind: ErrorKind, exception: impl Into<String>) -> Self {
        Self {
            kind,
            exception: exception.into(),
        }
    }

    pub fn interrupted() -> Self {
        Self::new(ErrorKind::Interrupted, "interrupted")
    }

    pub fn terminated(alias: &str) -> Self {
        Self::new(
            ErrorKind::Terminated,
            format!("execution unit for {} has exited", alias),
        )
    }

    pub fn dropped(err: &TransportError) -> Self {
        Self::new(
            ErrorKind::ConnectionDropped,
            format!("connection dropped: {}", err),
        )
    }
}

impl From<&ConnectError> for ErrorRecord {
    fn from(err: &ConnectError) -> Self {
        let kind = match err {
            ConnectError::HostResolution { .. } => ErrorKind::HostResolution,
            ConnectError::UnsupportedAuth { .. } => ErrorKind::UnsupportedAuth,
            ConnectError::Authentication { .. } => ErrorKind::Authentication,
            ConnectError::Transport(_) => ErrorKind::Transport,
        };
        Self::new(kind, err.to_string())
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.exception, self.kind)
    }
}
