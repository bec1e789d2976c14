//! CLI module: a stdio host for the handler
//!
//! Provides:
//! - serve: answer newline-delimited JSON requests on stdin/stdout
//! - dump: one-shot get_all_users
//! - schema: print the request schema

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, StoreOptions};
pub use commands::{dump, run_command, schema, serve, serve_stream};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_line, Envelope};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}
