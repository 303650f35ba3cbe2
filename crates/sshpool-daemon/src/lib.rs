//! sshpool-daemon: HTTP control surface over the channel registry
//!
//! The daemon keeps named SSH channels open and exposes them over a small
//! HTTP API. Channel lifecycle lives in `sshpool-core`; this crate adds the
//! russh-backed transport, the axum router, and the `sshpoold` binary.

pub mod http;
pub mod state;
pub mod transport;

pub use state::DaemonState;
