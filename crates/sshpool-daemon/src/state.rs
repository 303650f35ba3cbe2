//! Shared daemon state

use std::sync::Arc;

use sshpool_core::config::DaemonConfig;
use sshpool_core::{ChannelRegistry, Connector};

/// State handed to every HTTP handler
#[derive(Clone)]
pub struct DaemonState {
    /// Configuration the daemon was started with
    pub config: Arc<DaemonConfig>,
    /// Registry of managed channels
    pub registry: Arc<ChannelRegistry>,
}

impl DaemonState {
    pub fn new(config: DaemonConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ChannelRegistry::new(connector)),
        }
    }

    /// Register descriptors at boot, logging and skipping the ones that fail
    /// to parse. Returns how many were registered.
    pub fn preregister<'a>(&self, descriptors: impl IntoIterator<Item = &'a str>) -> usize {
        let mut registered = 0;
        for descriptor in descriptors {
            match self.registry.init(descriptor, true) {
                Ok(channel) => {
                    tracing::debug!(channel = %channel.dsn().redacted(), "Preregistered channel");
                    registered += 1;
                }
                Err(e) => tracing::warn!("Skipping descriptor: {}", e),
            }
        }
        registered
    }
}
