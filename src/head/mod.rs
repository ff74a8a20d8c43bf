//! # File Head Index
//!
//! One head per file: the pointer to its latest version, its live stats
//! and its lifecycle flags. Heads are updated, never removed.

pub mod index;
pub mod lifecycle;
pub mod record;

pub use index::HeadIndex;
pub use lifecycle::{LifecycleError, Transition};
pub use record::FileHead;
