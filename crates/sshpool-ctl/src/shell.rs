//! Interactive shell
//!
//! A line-oriented prompt over the same commands the subcommands use.
//! Ctrl+C or end of input leaves the shell.

use std::io::Write;

use anyhow::Result;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::PoolClient;
use crate::commands::{run_command, start_command, status_command, stop_command};
use crate::output::{print_error, print_info};

pub const PROMPT: &str = "sshpool> ";

const ACTIONS: &[(&str, &str)] = &[
    ("status", "status [alias]\n\tShow every channel, or only the given one."),
    (
        "start",
        "start <dsn>\n\tRegister a channel, e.g. start web://deploy@web1.example.com:22",
    ),
    ("run", "run <alias> <command>\n\tRun a command on a channel."),
    ("stop", "stop <alias>\n\tClose a channel and remove it."),
    ("help", "help [action]\n\tList actions, or describe one."),
    ("exit", "exit\n\tLeave the shell (also: quit)."),
];

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Status(Option<String>),
    Start(String),
    Run { alias: String, command: String },
    Stop(String),
    Help(Option<String>),
    Exit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown action '{0}', type 'help' for a list")]
    Unknown(String),
}

/// Parse one shell line
pub fn parse_line(line: &str) -> Result<ShellCommand, ParseError> {
    let line = line.trim();
    let (action, rest) = match line.split_once(char::is_whitespace) {
        Some((action, rest)) => (action, rest.trim()),
        None => (line, ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    match action {
        "" => Ok(ShellCommand::Empty),
        "status" => Ok(ShellCommand::Status(arg)),
        "start" => arg.map(ShellCommand::Start).ok_or(ParseError::Usage("start <dsn>")),
        "stop" => arg.map(ShellCommand::Stop).ok_or(ParseError::Usage("stop <alias>")),
        "run" => match rest.split_once(char::is_whitespace) {
            Some((alias, command)) if !command.trim().is_empty() => Ok(ShellCommand::Run {
                alias: alias.to_string(),
                command: command.trim().to_string(),
            }),
            _ => Err(ParseError::Usage("run <alias> <command>")),
        },
        "help" | "?" => Ok(ShellCommand::Help(arg)),
        "exit" | "quit" => Ok(ShellCommand::Exit),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

/// Help text for one action, or the list of actions
pub fn help_text(action: Option<&str>) -> String {
    match action {
        Some(action) => {
            let action = if action == "quit" { "exit" } else { action };
            ACTIONS
                .iter()
                .find(|(name, _)| *name == action)
                .map(|(_, text)| text.to_string())
                .unwrap_or_else(|| format!("No help for '{}'", action))
        }
        None => {
            let names: Vec<&str> = ACTIONS.iter().map(|(name, _)| *name).collect();
            format!("Actions: {}\nType 'help <action>' for details.", names.join(", "))
        }
    }
}

/// Run the interactive loop until exit, Ctrl+C, or end of input
pub async fn run_shell(client: &PoolClient) -> Result<()> {
    print_info(&format!("Connected to {}. Type 'help' for a list of actions.", client.base_url()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match parse_line(&line) {
            Ok(ShellCommand::Exit) => break,
            Ok(command) => dispatch(client, command).await,
            Err(e) => print_error(&e.to_string()),
        }
    }
    Ok(())
}

async fn dispatch(client: &PoolClient, command: ShellCommand) {
    let result = match command {
        ShellCommand::Empty | ShellCommand::Exit => Ok(()),
        ShellCommand::Status(alias) => status_command(client, alias.as_deref()).await,
        ShellCommand::Start(dsn) => start_command(client, &dsn).await,
        ShellCommand::Run { alias, command } => {
            run_command(client, &alias, &command).await.map(|_| ())
        }
        ShellCommand::Stop(alias) => stop_command(client, &alias).await,
        ShellCommand::Help(action) => {
            println!("{}", help_text(action.as_deref()));
            Ok(())
        }
    };
    // Already printed by the command; the shell keeps going
    if let Err(e) = result {
        tracing::debug!("Shell command failed: {:#}", e);
    }
}
