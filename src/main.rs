//! tabvault CLI entry point
//!
//! Parses arguments, dispatches to the CLI module and exits non-zero on
//! failure. Everything else is delegated to `cli::run`.

use tabvault::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
