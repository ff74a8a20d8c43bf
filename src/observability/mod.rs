//! Observability for tabvault
//!
//! - Diagnostic logging through `tracing`, installed by [`init_tracing`]
//! - Audit events for every successful mutation, delivered to an [`AuditSink`]
//!
//! # Principles
//!
//! 1. Observability never changes the outcome of an operation
//! 2. Audit delivery failures are logged and swallowed

pub mod audit;

pub use audit::{
    AuditError, AuditEvent, AuditResult, AuditSeverity, AuditSink, FileAuditSink,
    MemoryAuditSink, NullAuditSink,
};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_level`. Installing twice is a
/// no-op.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing("debug");
        init_tracing("not a level [");
        tracing::info!("still logging");
    }
}
