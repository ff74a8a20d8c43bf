//! # Per-File Locks
//!
//! Exclusive, bounded-wait locks keyed by file id. Every mutation of an
//! existing file holds its lock from the first read of the head until the
//! unit of work commits or is dropped.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use super::errors::{StorageError, StorageResult};

/// Registry of held file locks.
#[derive(Debug)]
pub struct FileLocks {
    held: Mutex<HashSet<Uuid>>,
    released: Condvar,
    timeout: Duration,
}

impl FileLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Take the lock for `file_id`, waiting at most the configured timeout.
    pub fn acquire(&self, file_id: Uuid) -> StorageResult<FileLockGuard<'_>> {
        let deadline = Instant::now() + self.timeout;
        let mut held = self.held.lock();

        while held.contains(&file_id) {
            if self.released.wait_until(&mut held, deadline).timed_out() && held.contains(&file_id) {
                return Err(StorageError::LockTimeout(format!(
                    "lock on file {} after {:?}",
                    file_id, self.timeout
                )));
            }
        }

        held.insert(file_id);
        tracing::debug!(%file_id, "file lock acquired");
        Ok(FileLockGuard { locks: self, file_id })
    }

    pub fn is_locked(&self, file_id: Uuid) -> bool {
        self.held.lock().contains(&file_id)
    }

    fn release(&self, file_id: Uuid) {
        self.held.lock().remove(&file_id);
        self.released.notify_all();
    }
}

/// Releases its file lock when dropped.
#[derive(Debug)]
pub struct FileLockGuard<'a> {
    locks: &'a FileLocks,
    file_id: Uuid,
}

impl FileLockGuard<'_> {
    pub fn file_id(&self) -> Uuid {
        self.file_id
    }
}

impl Drop for FileLockGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(self.file_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_release_on_drop() {
        let locks = FileLocks::new(Duration::from_millis(50));
        let id = Uuid::new_v4();
        {
            let guard = locks.acquire(id).unwrap();
            assert_eq!(guard.file_id(), id);
            assert!(locks.is_locked(id));
        }
        assert!(!locks.is_locked(id));
        assert!(locks.acquire(id).is_ok());
    }

    #[test]
    fn test_timeout_when_held() {
        let locks = FileLocks::new(Duration::from_millis(20));
        let id = Uuid::new_v4();
        let _guard = locks.acquire(id).unwrap();

        let result = locks.acquire(id);
        assert!(matches!(result, Err(StorageError::LockTimeout(ref msg)) if msg.contains("20ms")));
    }

    #[test]
    fn test_independent_files() {
        let locks = FileLocks::new(Duration::from_millis(20));
        let _a = locks.acquire(Uuid::new_v4()).unwrap();
        assert!(locks.acquire(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_waiter_wakes_on_release() {
        let locks = Arc::new(FileLocks::new(Duration::from_secs(5)));
        let id = Uuid::new_v4();
        let guard = locks.acquire(id).unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || locks.acquire(id).map(|_| ()))
        };

        thread::sleep(Duration::from_millis(20));
        drop(guard);
        assert!(waiter.join().unwrap().is_ok());
    }
}
