//! Transport traits
//!
//! The secure-shell handshake and command execution are delegated to an
//! existing client implementation. The registry only needs these two seams.

use async_trait::async_trait;

use crate::dsn::Dsn;
use crate::error::{ConnectError, TransportError};
use crate::record::CommandOutput;

/// Establishes remote shell sessions
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform the handshake for the given descriptor
    async fn connect(&self, target: &Dsn) -> Result<Box<dyn RemoteShell>, ConnectError>;
}

/// An established session able to run one command at a time
#[async_trait]
pub trait RemoteShell: Send {
    /// Run a command to completion, draining stdout and stderr
    ///
    /// An error means the session itself is no longer usable.
    async fn exec(&mut self, command: &str) -> Result<CommandOutput, TransportError>;

    /// Close the underlying connection
    async fn close(&mut self);
}
