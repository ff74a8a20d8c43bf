//! tabvault - versioned tabular file storage with access control
//!
//! Uploaded spreadsheets and delimited text files are parsed into rows and
//! kept under an immutable, per-file version history. Files can be
//! replaced, reverted to an earlier version, soft-deleted and restored,
//! and private files can be shared with individual users.

pub mod access;
pub mod api;
pub mod cli;
pub mod config;
pub mod head;
pub mod identity;
pub mod ledger;
pub mod observability;
pub mod parser;
pub mod rows;
pub mod storage;
pub mod vault;
