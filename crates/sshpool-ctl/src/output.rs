//! Output formatting utilities for the CLI

use std::collections::BTreeMap;

use tabled::{settings::Style, Table, Tabled};

use sshpool_core::record::TextOutput;
use sshpool_core::time::format_uptime;
use sshpool_core::ChannelInfo;

/// Format registered channels as a table
///
/// The password, when present, is masked.
pub fn format_channels(channels: &BTreeMap<String, ChannelInfo>) -> String {
    if channels.is_empty() {
        return "No channels registered".to_string();
    }

    #[derive(Tabled)]
    struct ChannelRow {
        #[tabled(rename = "ALIAS")]
        alias: String,
        #[tabled(rename = "TARGET")]
        target: String,
        #[tabled(rename = "STATUS")]
        status: &'static str,
        #[tabled(rename = "STATE")]
        state: String,
        #[tabled(rename = "UPTIME")]
        uptime: String,
    }

    let rows: Vec<ChannelRow> = channels
        .iter()
        .map(|(alias, info)| ChannelRow {
            alias: alias.clone(),
            target: format_target(info),
            status: if info.is_alive { "running" } else { "dead" },
            state: info.state.to_string(),
            uptime: format_uptime(info.uptime_seconds),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// `user[:***]@host:port`
pub fn format_target(info: &ChannelInfo) -> String {
    let host = if info.hostname.contains(':') {
        format!("[{}]", info.hostname)
    } else {
        info.hostname.clone()
    };
    match info.password {
        Some(_) => format!("{}:***@{}:{}", info.username, host, info.port),
        None => format!("{}@{}:{}", info.username, host, info.port),
    }
}

/// The stream worth showing for a finished command: stdout on success,
/// stderr otherwise
pub fn command_text(output: &TextOutput) -> &str {
    if output.exit_code == 0 {
        &output.stdout
    } else {
        &output.stderr
    }
}

/// Print a command's output to the matching stream
pub fn print_command_output(output: &TextOutput) {
    let text = command_text(output);
    let newline = if text.is_empty() || text.ends_with('\n') { "" } else { "\n" };
    if output.exit_code == 0 {
        print!("{}{}", text, newline);
    } else {
        eprint!("{}{}", text, newline);
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
