//! CLI argument definitions using clap
//!
//! Commands:
//! - tabvault init --config <path>
//! - tabvault serve --config <path>
//! - tabvault exec --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tabvault - versioned tabular file storage
#[derive(Parser, Debug)]
#[command(name = "tabvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./tabvault.json")]
        config: PathBuf,
    },

    /// Read JSON requests line by line from stdin until EOF
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./tabvault.json")]
        config: PathBuf,
    },

    /// Execute a single JSON request from stdin and exit
    Exec {
        /// Path to configuration file
        #[arg(long, default_value = "./tabvault.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
