//! Error types for walredo core.

use crate::types::TransactionId;
use std::io;
use thiserror::Error;
use walredo_storage::StorageError;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during a recovery run.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage error outside of replay (seeding, flushing).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A log line could not be parsed.
    ///
    /// Fatal: transaction boundaries cannot be trusted, so nothing is replayed.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the log text.
        line: usize,
        /// Description of what was wrong, including the offending text.
        message: String,
    },

    /// The store rejected a read or write while flushing a commit.
    ///
    /// The log refers to a row or column the store does not contain.
    #[error("replay of {txid} failed at record {position}: {source}")]
    Replay {
        /// Position of the commit record being flushed.
        position: usize,
        /// Transaction being flushed.
        txid: TransactionId,
        /// The store error.
        #[source]
        source: StorageError,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Creates a replay error.
    pub fn replay(position: usize, txid: &TransactionId, source: StorageError) -> Self {
        Self::Replay {
            position,
            txid: txid.clone(),
            source,
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns `true` if the error came from an unknown row or column.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Replay { source, .. } | Self::Storage(source) => source.is_not_found(),
            _ => false,
        }
    }
}
