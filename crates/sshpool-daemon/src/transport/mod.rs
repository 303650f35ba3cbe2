//! Secure-shell transport backed by russh

mod ssh;

pub use ssh::{RusshConnector, RusshShell};
