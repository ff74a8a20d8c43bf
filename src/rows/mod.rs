//! # Row Store
//!
//! Data rows of every file version. A version's row set is written once,
//! together with its ledger entry, and never changes afterwards.

pub mod record;
pub mod store;

pub use record::{Cell, RowRecord};
pub use store::RowStore;
