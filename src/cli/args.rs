//! CLI argument definitions using clap
//!
//! Commands:
//! - userdb serve [--config <path>] [--store <path>] [--log-level <level>]
//! - userdb dump  [--config <path>] [--store <path>] [--log-level <level>]
//! - userdb schema

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// userdb - user record RPC handler over a durable JSON document
#[derive(Parser, Debug)]
#[command(name = "userdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options locating the store, shared by commands that open it
#[derive(Args, Debug, Clone, Default)]
pub struct StoreOptions {
    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backing document path (overrides the configuration file)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Minimum log severity: trace, info, warn, error, fatal
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve newline-delimited JSON requests from stdin, one response per line on stdout
    Serve {
        #[command(flatten)]
        options: StoreOptions,
    },

    /// Print every stored user and exit
    Dump {
        #[command(flatten)]
        options: StoreOptions,
    },

    /// Print the request schema and exit
    Schema,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_store() {
        let cli = Cli::try_parse_from(["userdb", "serve", "--store", "/tmp/users.json"]).unwrap();
        match cli.command {
            Command::Serve { options } => {
                assert_eq!(options.store, Some(PathBuf::from("/tmp/users.json")));
                assert!(options.config.is_none());
            }
            _ => panic!("Expected Serve"),
        }
    }

    #[test]
    fn test_parse_schema() {
        let cli = Cli::try_parse_from(["userdb", "schema"]).unwrap();
        assert!(matches!(cli.command, Command::Schema));
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Cli::try_parse_from(["userdb"]).is_err());
    }
}
