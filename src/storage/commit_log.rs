//! # Commit Log
//!
//! Durable record of committed units of work. The store appends a batch
//! before applying it to the tables, and rebuilds the tables by replaying
//! the log on open.

use std::fmt;

use parking_lot::Mutex;

use super::errors::StorageResult;
use super::unit_of_work::CommitBatch;

/// Backend trait for commit persistence
pub trait CommitLog: Send + Sync + fmt::Debug {
    /// Durably append one batch. On error nothing must be recorded.
    fn append(&self, batch: &CommitBatch) -> StorageResult<()>;

    /// Every recorded batch in append order.
    fn replay(&self) -> StorageResult<Vec<CommitBatch>>;
}

/// Keeps batches in memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCommitLog {
    batches: Mutex<Vec<CommitBatch>>,
}

impl MemoryCommitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.lock().is_empty()
    }
}

impl CommitLog for MemoryCommitLog {
    fn append(&self, batch: &CommitBatch) -> StorageResult<()> {
        self.batches.lock().push(batch.clone());
        Ok(())
    }

    fn replay(&self) -> StorageResult<Vec<CommitBatch>> {
        Ok(self.batches.lock().clone())
    }
}
