//! Audit events
//!
//! One event is emitted after every successful mutating call. Sinks are
//! append-only; the file sink writes one JSON object per line and syncs
//! after each write.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Source tag carried by every event from the file service.
pub const FILE_SOURCE: &str = "file";

/// Result type for audit delivery
pub type AuditResult<T> = Result<T, AuditError>;

/// Audit delivery failures. Never fatal to the audited operation.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Audit severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditSeverity {
    Info,
    Warning,
}

impl fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditSeverity::Info => write!(f, "INFO"),
            AuditSeverity::Warning => write!(f, "WARNING"),
        }
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub severity: AuditSeverity,
    pub source: String,
    /// Operation name, e.g. `upload`
    pub action: String,
    pub message: String,
    pub user_id: Uuid,
    pub metadata: serde_json::Value,
}

impl AuditEvent {
    /// Informational event from the file service.
    pub fn file(action: impl Into<String>, user_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity: AuditSeverity::Info,
            source: FILE_SOURCE.to_string(),
            action: action.into(),
            message: message.into(),
            user_id,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> AuditResult<()>;
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: &AuditEvent) -> AuditResult<()> {
        Ok(())
    }
}

/// Keeps events in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Actions in arrival order.
    pub fn actions(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.action.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) -> AuditResult<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Append-only JSON-lines audit file.
pub struct FileAuditSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileAuditSink {
    /// Open or create an audit file.
    pub fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for FileAuditSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAuditSink").field("path", &self.path).finish()
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) -> AuditResult<()> {
        let line = serde_json::to_string(event)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }
}
