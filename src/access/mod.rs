//! # Access Control
//!
//! Per-user grants on files and the visibility rule that combines them
//! with ownership, privacy and the caller's capabilities.

pub mod control;
pub mod grant;
pub mod visibility;

pub use control::AccessControl;
pub use grant::AccessGrant;
pub use visibility::is_visible;
