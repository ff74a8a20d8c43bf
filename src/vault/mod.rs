//! # File Service
//!
//! Upload, Replace, Revert, Delete/Reset, List, History, GetData and
//! access grants over the shared store.

pub mod errors;
pub mod requests;
pub mod service;
pub mod views;

pub use errors::{VaultError, VaultResult};
pub use requests::{ListOptions, ReplaceRequest, RevertRequest, UploadFile, UploadRequest};
pub use service::{FileVault, VaultOptions, DEFAULT_MAX_UPLOAD_BYTES};
pub use views::{DataView, FileListing, GrantView, HistoryEntry};
