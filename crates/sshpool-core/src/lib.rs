//! sshpool-core: Channel lifecycle management for sshpool
//!
//! This crate owns the pieces with real concurrency and failure-handling
//! substance: connection descriptors, the per-channel execution unit, and
//! the alias → channel registry shared by every control-surface handler.

pub mod channel;
pub mod config;
pub mod dsn;
pub mod error;
pub mod record;
pub mod registry;
pub mod time;
pub mod transport;

pub use channel::{Channel, ChannelInfo, ChannelState};
pub use dsn::Dsn;
pub use error::{ConnectError, DsnError, ExecError, PoolError, RegistryError, TransportError};
pub use record::{CommandOutput, ErrorKind, ErrorRecord, Reply};
pub use registry::ChannelRegistry;
pub use transport::{Connector, RemoteShell};
