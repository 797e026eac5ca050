//! Storage error types.

use thiserror::Error;
use warden_core::{ContentType, ReportStatus, ValidationError};

/// Errors that can occur in storage and moderation operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from rusqlite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (e.g., creating directories).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Input rejected before any state change.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The reporter already has an open report on this content.
    #[error("Duplicate report: user {reporter_id} already has an open report on {} {content_id}", .content_type.as_str())]
    DuplicateReport {
        content_type: ContentType,
        content_id: i64,
        reporter_id: i64,
    },

    /// The reported content does not exist.
    #[error("Content not found: {} {content_id}", .content_type.as_str())]
    ContentNotFound {
        content_type: ContentType,
        content_id: i64,
    },

    /// The report does not exist.
    #[error("Report not found: {0}")]
    ReportNotFound(i64),

    /// The report was already closed.
    #[error("Report {id} is already {}", .status.as_str())]
    AlreadyResolved { id: i64, status: ReportStatus },

    /// A report filing limit was reached.
    #[error("Report limit exceeded: {0}")]
    ReportLimitExceeded(String),

    /// A multi-record moderation step could not be committed; nothing was applied.
    #[error("Transaction failed: {0}")]
    Transaction(String),
}

impl StorageError {
    /// Returns true if retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transaction(_))
    }

    /// Returns true if this is a SQLite constraint violation.
    pub(crate) fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }

    /// Turns low-level database failures inside a transaction into
    /// [`StorageError::Transaction`]; domain errors pass through unchanged.
    pub(crate) fn into_transaction_failure(self) -> Self {
        match self {
            StorageError::Database(e) => StorageError::Transaction(e.to_string()),
            StorageError::Json(e) => StorageError::Transaction(e.to_string()),
            other => other,
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
