//! API error types
//!
//! File service errors pass through with their own codes; the API adds
//! codes only for failures that happen before the service is called.

use std::fmt;

use crate::vault::VaultError;

/// API-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Request is not valid JSON or misses fields
    InvalidRequest,
    /// `user_id` does not resolve to a known user
    Unauthenticated,
    /// A referenced content file could not be read
    FileRead,
    /// Pass-through error from the file service
    PassThrough,
}

impl ApiErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidRequest => "INVALID_REQUEST",
            ApiErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ApiErrorCode::FileRead => "FILE_READ_ERROR",
            ApiErrorCode::PassThrough => "PASS_THROUGH",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// API error with preserved service error information
#[derive(Debug, Clone)]
pub struct ApiError {
    code: String,
    message: String,
    retryable: bool,
}

impl ApiError {
    fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code().to_string(),
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidRequest, reason)
    }

    pub fn unauthenticated(user: impl fmt::Display) -> Self {
        Self::new(ApiErrorCode::Unauthenticated, format!("Unknown user: {}", user))
    }

    pub fn file_read(path: impl fmt::Display, err: std::io::Error) -> Self {
        Self::new(ApiErrorCode::FileRead, format!("Cannot read {}: {}", path, err))
    }

    /// Create from a file service error (pass-through)
    pub fn from_vault_error(err: VaultError) -> Self {
        Self {
            code: err.code().to_string(),
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        Self::from_vault_error(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
