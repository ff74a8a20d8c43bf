//! # Version Ledger
//!
//! Append-only history of every file. Versions of a file run 1..=N with
//! no gaps, and N is always the head's version.

pub mod entry;
pub mod versions;

pub use entry::VersionEntry;
pub use versions::VersionLedger;
