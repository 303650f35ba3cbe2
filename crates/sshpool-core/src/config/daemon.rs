//! Daemon configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Address the daemon listens on unless configured otherwise
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8877";

/// `[daemon]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Address the HTTP control surface binds to
    pub bind_address: String,

    /// Descriptors registered at boot
    pub channels: Vec<String>,

    /// Newline-separated descriptor file registered at boot
    pub channels_file: Option<PathBuf>,

    /// Upper bound on one handshake, in seconds
    #[serde(with = "super::serde_utils::duration_secs")]
    pub connect_timeout: Duration,

    /// Private keys offered in addition to the default ones
    pub identity_files: Vec<PathBuf>,

    /// known_hosts file consulted for host keys (defaults to the user's)
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            channels: Vec::new(),
            channels_file: None,
            connect_timeout: Duration::from_secs(30),
            identity_files: Vec::new(),
            known_hosts_path: None,
        }
    }
}

impl DaemonConfig {
    /// Replace the host and/or port part of `bind_address`
    pub fn override_bind(&mut self, host: Option<&str>, port: Option<u16>) {
        if host.is_none() && port.is_none() {
            return;
        }
        let (current_host, current_port) = match self.bind_address.rsplit_once(':') {
            Some((h, p)) => (h.to_string(), p.parse().unwrap_or(8877)),
            None => (self.bind_address.clone(), 8877),
        };
        self.bind_address = format!(
            "{}:{}",
            host.unwrap_or(&current_host),
            port.unwrap_or(current_port)
        );
    }
}
