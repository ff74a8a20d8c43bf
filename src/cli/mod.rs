//! CLI module for tabvault
//!
//! Provides command-line interface for:
//! - init: Create the data directory and commit log
//! - serve: Boot and answer JSON requests from stdin on a worker pool
//! - exec: Boot and answer a single JSON request

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{boot, exec, init, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_json};
