//! Control client configuration

use serde::{Deserialize, Serialize};

use super::DEFAULT_BIND_ADDRESS;

/// `[ctl]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CtlConfig {
    /// `host:port` (or full base URL) of the daemon
    pub server: String,
}

impl Default for CtlConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

impl CtlConfig {
    /// Base URL for HTTP requests, adding `http://` when no scheme is given
    pub fn base_url(&self) -> String {
        let server = self.server.trim_end_matches('/');
        if server.starts_with("http://") || server.starts_with("https://") {
            server.to_string()
        } else {
            format!("http://{}", server)
        }
    }
}
