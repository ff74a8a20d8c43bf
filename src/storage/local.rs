//! # Local Commit Log
//!
//! Append-only file at `<data_dir>/commits.log`, one batch per line:
//!
//! ```text
//! <crc32 as 8 hex digits> <batch as JSON>\n
//! ```
//!
//! Every append is followed by fsync. A line that is incomplete or fails
//! its checksum at the very end of the file is a torn write: it is
//! discarded and the file truncated. A bad line followed by good ones is
//! corruption.
//!
//! A failed append is rolled back by truncating to the previous length.
//! If that truncation fails too, the log refuses every later append, since
//! a record written after the fragment would turn the torn tail into
//! mid-log corruption.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::checksum::{compute_checksum, verify_checksum};
use super::commit_log::CommitLog;
use super::errors::{StorageError, StorageResult};
use super::unit_of_work::CommitBatch;

/// File name of the commit log inside the data directory.
pub const COMMIT_LOG_FILE: &str = "commits.log";

/// Append handle behind the commit log.
pub(crate) trait LogFile: Write + Send + fmt::Debug {
    fn len(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LogFile for File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_all()
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Local filesystem commit log
#[derive(Debug)]
pub struct LocalCommitLog {
    path: PathBuf,
    file: Mutex<Box<dyn LogFile>>,
    poisoned: AtomicBool,
}

impl LocalCommitLog {
    /// Open or create the commit log under `data_dir`.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(data_dir)
            .map_err(|e| StorageError::io(format!("create {}", data_dir.display()), e))?;

        let path = data_dir.join(COMMIT_LOG_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(format!("open {}", path.display()), e))?;

        Ok(Self::with_file(path, Box::new(file)))
    }

    pub(crate) fn with_file(path: PathBuf, file: Box<dyn LogFile>) -> Self {
        Self {
            path,
            file: Mutex::new(file),
            poisoned: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(batch: &CommitBatch) -> StorageResult<Vec<u8>> {
        let json = serde_json::to_vec(batch)
            .map_err(|e| StorageError::Io(format!("encode batch {}: {}", batch.sequence, e)))?;
        let mut line = format!("{:08x} ", compute_checksum(&json)).into_bytes();
        line.extend_from_slice(&json);
        line.push(b'\n');
        Ok(line)
    }

    fn decode(line: &[u8]) -> Option<CommitBatch> {
        let split = line.iter().position(|&b| b == b' ')?;
        let (crc, json) = (&line[..split], &line[split + 1..]);
        let crc = u32::from_str_radix(std::str::from_utf8(crc).ok()?, 16).ok()?;
        if !verify_checksum(json, crc) {
            return None;
        }
        serde_json::from_slice(json).ok()
    }

    fn truncate(&self, len: u64) -> StorageResult<()> {
        self.file
            .lock()
            .truncate(len)
            .map_err(|e| StorageError::io(format!("truncate {}", self.path.display()), e))
    }

    /// True once a failed append could not be rolled back.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }
}

impl CommitLog for LocalCommitLog {
    fn append(&self, batch: &CommitBatch) -> StorageResult<()> {
        if self.is_poisoned() {
            return Err(StorageError::Corruption(format!(
                "{}: holds an unterminated record from a failed append",
                self.path.display()
            )));
        }

        let line = Self::encode(batch)?;
        let mut file = self.file.lock();

        let before = file
            .len()
            .map_err(|e| StorageError::io(format!("stat {}", self.path.display()), e))?;

        let written = file.write_all(&line).and_then(|_| file.sync());
        if let Err(e) = written {
            // Drop whatever part of the line reached the file.
            if let Err(rollback) = file.truncate(before) {
                self.poisoned.store(true, Ordering::Release);
                tracing::error!(
                    path = %self.path.display(),
                    sequence = batch.sequence,
                    error = %rollback,
                    "failed append could not be rolled back"
                );
                return Err(StorageError::Corruption(format!(
                    "{}: append of commit {} failed ({}) and rollback failed ({})",
                    self.path.display(),
                    batch.sequence,
                    e,
                    rollback
                )));
            }
            return Err(StorageError::io(format!("append to {}", self.path.display()), e));
        }
        Ok(())
    }

    fn replay(&self) -> StorageResult<Vec<CommitBatch>> {
        let content = fs::read(&self.path)
            .map_err(|e| StorageError::io(format!("read {}", self.path.display()), e))?;

        let mut batches = Vec::new();
        let mut offset = 0usize;

        while offset < content.len() {
            let rest = &content[offset..];
            let (line, complete) = match rest.iter().position(|&b| b == b'\n') {
                Some(end) => (&rest[..end], true),
                None => (rest, false),
            };
            let next = offset + line.len() + usize::from(complete);

            match Self::decode(line).filter(|_| complete) {
                Some(batch) => batches.push(batch),
                None if next >= content.len() => {
                    tracing::warn!(
                        path = %self.path.display(),
                        offset,
                        "discarding torn commit at end of log"
                    );
                    self.truncate(offset as u64)?;
                    break;
                }
                None => {
                    return Err(StorageError::Corruption(format!(
                        "{}: bad record at byte {}",
                        self.path.display(),
                        offset
                    )));
                }
            }
            offset = next;
        }

        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::unit_of_work::Write as TableWrite;
    use std::sync::Arc;
    use tempfile::TempDir;
    use uuid::Uuid;

    /// In-memory log file that accepts `budget` bytes, then fails writes.
    #[derive(Debug, Clone)]
    struct FlakyFile {
        bytes: Arc<Mutex<Vec<u8>>>,
        budget: Arc<Mutex<usize>>,
        truncate_fails: bool,
    }

    impl FlakyFile {
        fn new(budget: usize, truncate_fails: bool) -> Self {
            Self {
                bytes: Arc::default(),
                budget: Arc::new(Mutex::new(budget)),
                truncate_fails,
            }
        }

        fn contents(&self) -> Vec<u8> {
            self.bytes.lock().clone()
        }
    }

    impl Write for FlakyFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut budget = self.budget.lock();
            if *budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = buf.len().min(*budget);
            *budget -= n;
            self.bytes.lock().extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogFile for FlakyFile {
        fn len(&self) -> io::Result<u64> {
            Ok(self.bytes.lock().len() as u64)
        }

        fn truncate(&mut self, len: u64) -> io::Result<()> {
            if self.truncate_fails {
                return Err(io::Error::new(io::ErrorKind::Other, "read-only filesystem"));
            }
            self.bytes.lock().truncate(len as usize);
            Ok(())
        }

        fn sync(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn batch(seq: u64) -> CommitBatch {
        CommitBatch::new(seq, vec![TableWrite::DeleteGrant { grant_id: Uuid::new_v4() }])
    }

    #[test]
    fn test_append_replay() {
        let temp = TempDir::new().unwrap();
        let log = LocalCommitLog::open(temp.path()).unwrap();
        log.append(&batch(1)).unwrap();
        log.append(&batch(2)).unwrap();

        let reopened = LocalCommitLog::open(temp.path()).unwrap();
        let seqs: Vec<u64> = reopened.replay().unwrap().iter().map(|b| b.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn test_empty_log() {
        let temp = TempDir::new().unwrap();
        let log = LocalCommitLog::open(temp.path()).unwrap();
        assert!(log.replay().unwrap().is_empty());
        assert!(log.path().ends_with(COMMIT_LOG_FILE));
    }

    #[test]
    fn test_torn_tail_discarded() {
        let temp = TempDir::new().unwrap();
        let log = LocalCommitLog::open(temp.path()).unwrap();
        log.append(&batch(1)).unwrap();
        let good_len = fs::metadata(log.path()).unwrap().len();

        // Half of a second record, no newline.
        let partial = LocalCommitLog::encode(&batch(2)).unwrap();
        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        file.write_all(&partial[..partial.len() / 2]).unwrap();
        drop(file);

        let replayed = log.replay().unwrap();
        assert_eq!(replayed.len(), 1);
        assert_eq!(fs::metadata(log.path()).unwrap().len(), good_len);

        // Appends after truncation stay readable.
        log.append(&batch(2)).unwrap();
        assert_eq!(log.replay().unwrap().len(), 2);
    }

    #[test]
    fn test_corruption_in_middle_is_fatal() {
        let temp = TempDir::new().unwrap();
        let log = LocalCommitLog::open(temp.path()).unwrap();
        log.append(&batch(1)).unwrap();
        log.append(&batch(2)).unwrap();

        let mut bytes = fs::read(log.path()).unwrap();
        bytes[12] ^= 0xFF;
        fs::write(log.path(), &bytes).unwrap();

        let result = log.replay();
        assert!(matches!(result, Err(StorageError::Corruption(_))));
    }

    #[test]
    fn test_failed_append_rolled_back_is_retryable() {
        let file = FlakyFile::new(10, false);
        let log = LocalCommitLog::with_file(PathBuf::from("flaky.log"), Box::new(file.clone()));

        let err = log.append(&batch(1)).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert!(err.is_retryable());
        assert!(!log.is_poisoned());
        assert!(file.contents().is_empty());

        *file.budget.lock() = usize::MAX;
        assert!(log.append(&batch(1)).is_ok());
        let line = file.contents();
        assert_eq!(line.last(), Some(&b'\n'));
        assert!(LocalCommitLog::decode(&line[..line.len() - 1]).is_some());
    }

    #[test]
    fn test_failed_rollback_poisons_log() {
        let file = FlakyFile::new(10, true);
        let log = LocalCommitLog::with_file(PathBuf::from("flaky.log"), Box::new(file.clone()));

        let err = log.append(&batch(1)).unwrap_err();
        assert!(matches!(err, StorageError::Corruption(_)));
        assert!(!err.is_retryable());
        assert!(log.is_poisoned());

        // Nothing is written after the fragment, even once the disk recovers.
        *file.budget.lock() = usize::MAX;
        let err = log.append(&batch(1)).unwrap_err();
        assert!(matches!(err, StorageError::Corruption(_)));
        assert_eq!(file.contents().len(), 10);
    }
}
