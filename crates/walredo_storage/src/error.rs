//! Error types for table store operations.

use crate::table::RowId;
use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The table document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No row with the given id exists.
    #[error("row not found: {row}")]
    RowNotFound {
        /// The requested row.
        row: RowId,
    },

    /// The table has no column with the given name.
    #[error("column not found: {column}")]
    ColumnNotFound {
        /// The requested column.
        column: String,
    },

    /// Initial data columns have different lengths.
    #[error("column {column} has {actual} values, expected {expected}")]
    UnevenColumns {
        /// The offending column.
        column: String,
        /// Length of the first column.
        expected: usize,
        /// Length of the offending column.
        actual: usize,
    },
}

impl StorageError {
    /// Returns `true` if this error reports a missing row or column.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RowNotFound { .. } | Self::ColumnNotFound { .. }
        )
    }
}
