//! Start command implementation

use anyhow::Result;

use crate::client::{ClientError, PoolClient};
use crate::output::{print_error, print_success};

/// Register a descriptor with the daemon
pub async fn start_command(client: &PoolClient, dsn: &str) -> Result<()> {
    match client.start(dsn).await {
        Ok(()) => {
            print_success("OK");
            Ok(())
        }
        Err(ClientError::Status { code: 400, .. }) => {
            print_error(&format!("Invalid descriptor: {}", dsn));
            anyhow::bail!("invalid descriptor")
        }
        Err(e) => {
            print_error(&format!("Failed to start channel: {}", e));
            Err(e.into())
        }
    }
}
