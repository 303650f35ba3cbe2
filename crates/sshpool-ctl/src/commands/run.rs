//! Run command implementation

use anyhow::Result;

use crate::client::PoolClient;
use crate::output::{print_command_output, print_error};

/// Run `command` on `alias` and print stdout (exit 0) or stderr
///
/// Returns the remote exit code.
pub async fn run_command(client: &PoolClient, alias: &str, command: &str) -> Result<i32> {
    match client.run(alias, command).await {
        Ok(output) => {
            print_command_output(&output);
            Ok(output.exit_code)
        }
        Err(e) if e.is_not_found() => {
            print_error(&format!("Channel '{}' not found", alias));
            Err(e.into())
        }
        Err(e) => {
            print_error(&e.to_string());
            Err(e.into())
        }
    }
}
