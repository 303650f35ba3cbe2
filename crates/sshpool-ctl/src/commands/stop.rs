//! Stop command implementation

use anyhow::Result;

use crate::client::PoolClient;
use crate::output::{print_error, print_success};

/// Remove a channel and close its session
pub async fn stop_command(client: &PoolClient, alias: &str) -> Result<()> {
    match client.stop(alias).await {
        Ok(()) => {
            print_success("OK");
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            print_error(&format!("Channel '{}' not found", alias));
            Err(e.into())
        }
        Err(e) => {
            print_error(&format!("Failed to stop channel: {}", e));
            Err(e.into())
        }
    }
}
