//! CLI command implementations
//!
//! Shared by the one-shot subcommands and the interactive shell.

mod run;
mod start;
mod status;
mod stop;

pub use run::run_command;
pub use start::start_command;
pub use status::status_command;
pub use stop::stop_command;
