//! Status command implementation

use std::collections::BTreeMap;

use anyhow::Result;

use crate::client::PoolClient;
use crate::output::{format_channels, print_error};

/// Show every channel, or just `alias`
pub async fn status_command(client: &PoolClient, alias: Option<&str>) -> Result<()> {
    let channels = match alias {
        Some(alias) => match client.status(alias).await {
            Ok(info) => BTreeMap::from([(alias.to_string(), info)]),
            Err(e) if e.is_not_found() => {
                print_error(&format!("Channel '{}' not found", alias));
                return Err(e.into());
            }
            Err(e) => {
                print_error(&format!("Failed to get channel status: {}", e));
                return Err(e.into());
            }
        },
        None => match client.list().await {
            Ok(channels) => channels,
            Err(e) => {
                print_error(&format!("Failed to list channels: {}", e));
                return Err(e.into());
            }
        },
    };

    println!("{}", format_channels(&channels));
    Ok(())
}
