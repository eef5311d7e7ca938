//! Error types shared across Storynook
//!
//! Errors fall into two camps: those the reconciler self-heals (missing
//! media files) and those surfaced to the caller (database failures,
//! failed imports). Nothing here is retried automatically.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Storynook
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database migration failed
    #[error("Migration failed: {version} - {reason}")]
    MigrationFailed { version: i64, reason: String },

    /// Record not found in database
    #[error("Record not found: {entity} with id {identifier}")]
    RecordNotFound { entity: String, identifier: String },

    /// A persisted record failed validation
    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    /// File not found on disk
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    /// Creates a database error with a source
    pub fn database(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a database error without a source
    pub fn database_message(message: impl Into<String>) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            message: message.into(),
            source,
        }
    }

    /// Creates a record-not-found error
    pub fn not_found(entity: impl Into<String>, identifier: impl ToString) -> Self {
        Self::RecordNotFound {
            entity: entity.into(),
            identifier: identifier.to_string(),
        }
    }

    /// Returns true if this error means the requested record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }
}

impl From<io::Error> for AppError {
    fn from(source: io::Error) -> Self {
        Self::IoError {
            message: "I/O operation failed".to_string(),
            source,
        }
    }
}

/// Result alias using [`AppError`]
pub type Result<T> = std::result::Result<T, AppError>;
