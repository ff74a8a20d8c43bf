//! Request types of the file service

use uuid::Uuid;

use super::errors::{VaultError, VaultResult};

/// One file of an upload batch.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub content: Vec<u8>,
    /// Name the content arrived under; its extension selects the parser.
    /// Falls back to `filename` when absent.
    pub source_name: Option<String>,
    /// Name the file is stored under
    pub filename: String,
    pub private: bool,
}

impl UploadFile {
    pub fn new(content: impl Into<Vec<u8>>, filename: impl Into<String>, private: bool) -> Self {
        Self {
            content: content.into(),
            source_name: None,
            filename: filename.into(),
            private,
        }
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Name whose extension decides the format.
    pub fn format_name(&self) -> &str {
        self.source_name.as_deref().unwrap_or(&self.filename)
    }
}

/// A batch of new files, committed all or nothing.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub files: Vec<UploadFile>,
}

impl UploadRequest {
    pub fn new(files: Vec<UploadFile>) -> Self {
        Self { files }
    }

    /// Build from parallel arrays of contents, target names and privacy
    /// flags, which must have equal, non-zero length.
    pub fn from_parallel(
        contents: Vec<Vec<u8>>,
        filenames: Vec<String>,
        private: Vec<bool>,
    ) -> VaultResult<Self> {
        if contents.len() != filenames.len() || contents.len() != private.len() {
            return Err(VaultError::Validation(format!(
                "mismatched upload arrays: {} contents, {} filenames, {} privacy flags",
                contents.len(),
                filenames.len(),
                private.len()
            )));
        }
        if contents.is_empty() {
            return Err(VaultError::Validation("no files to upload".into()));
        }
        let files = contents
            .into_iter()
            .zip(filenames)
            .zip(private)
            .map(|((content, filename), private)| UploadFile::new(content, filename, private))
            .collect();
        Ok(Self { files })
    }
}

/// New content for an existing file.
#[derive(Debug, Clone)]
pub struct ReplaceRequest {
    pub file_id: Uuid,
    pub content: Vec<u8>,
    /// Falls back to the stored filename when absent.
    pub source_name: Option<String>,
}

impl ReplaceRequest {
    pub fn new(file_id: Uuid, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_id,
            content: content.into(),
            source_name: None,
        }
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

/// Restore an earlier version's content as a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevertRequest {
    pub file_id: Uuid,
    pub version: u32,
}

/// Listing filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Also return soft-deleted files the caller may see
    pub include_deleted: bool,
}
