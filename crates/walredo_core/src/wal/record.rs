//! Log record types.

use crate::types::TransactionId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use walredo_storage::RowId;

/// Type of log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRecordType {
    /// Transaction start.
    Start,
    /// Field write.
    Write,
    /// Transaction commit.
    Commit,
    /// Checkpoint marker.
    Checkpoint,
    /// Crash marker.
    Crash,
}

impl LogRecordType {
    /// Returns the upper-case name used in dumps.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Write => "WRITE",
            Self::Commit => "COMMIT",
            Self::Checkpoint => "CHECKPOINT",
            Self::Crash => "CRASH",
        }
    }
}

impl fmt::Display for LogRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogRecord {
    /// A transaction started.
    Start {
        /// Transaction ID.
        txid: TransactionId,
    },

    /// A transaction wrote one field.
    Write {
        /// Transaction ID.
        txid: TransactionId,
        /// Target row.
        row: RowId,
        /// Target column.
        column: String,
        /// New value, uninterpreted.
        value: String,
    },

    /// A transaction committed.
    Commit {
        /// Transaction ID.
        txid: TransactionId,
    },

    /// Checkpoint listing the transactions active when it was taken.
    Checkpoint {
        /// Active transactions; may be empty.
        active: BTreeSet<TransactionId>,
    },

    /// The system crashed here. Nothing after it is replayed.
    Crash,
}

impl LogRecord {
    /// Creates a start record.
    pub fn start(txid: impl Into<String>) -> Self {
        Self::Start {
            txid: TransactionId::new(txid),
        }
    }

    /// Creates a write record.
    pub fn write(
        txid: impl Into<String>,
        row: u64,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Write {
            txid: TransactionId::new(txid),
            row: RowId::new(row),
            column: column.into(),
            value: value.into(),
        }
    }

    /// Creates a commit record.
    pub fn commit(txid: impl Into<String>) -> Self {
        Self::Commit {
            txid: TransactionId::new(txid),
        }
    }

    /// Creates a checkpoint record.
    pub fn checkpoint<I, S>(active: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Checkpoint {
            active: active.into_iter().map(TransactionId::new).collect(),
        }
    }

    /// Returns the record type.
    #[must_use]
    pub fn record_type(&self) -> LogRecordType {
        match self {
            Self::Start { .. } => LogRecordType::Start,
            Self::Write { .. } => LogRecordType::Write,
            Self::Commit { .. } => LogRecordType::Commit,
            Self::Checkpoint { .. } => LogRecordType::Checkpoint,
            Self::Crash => LogRecordType::Crash,
        }
    }

    /// Returns the transaction ID if this record belongs to one.
    #[must_use]
    pub fn txid(&self) -> Option<&TransactionId> {
        match self {
            Self::Start { txid } | Self::Write { txid, .. } | Self::Commit { txid } => Some(txid),
            Self::Checkpoint { .. } | Self::Crash => None,
        }
    }
}

/// Renders the record in log line format, wrapped in angle brackets.
impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start { txid } => write!(f, "<start {txid}>"),
            Self::Write {
                txid,
                row,
                column,
                value,
            } => write!(f, "<{txid},{},{column},{value}>", row.as_u64()),
            Self::Commit { txid } => write!(f, "<commit {txid}>"),
            Self::Checkpoint { active } => {
                let ids: Vec<&str> = active.iter().map(TransactionId::as_str).collect();
                write!(f, "<CKPT ({})>", ids.join(","))
            }
            Self::Crash => write!(f, "<crash>"),
        }
    }
}
