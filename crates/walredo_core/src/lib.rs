//! # walredo Core
//!
//! REDO pass of write-ahead-log crash recovery.
//!
//! This crate provides:
//! - A parser turning delimited log lines into typed [`LogRecord`]s
//! - Checkpoint analysis computing which transactions are not yet durable
//!   and where replay must begin
//! - A redo engine buffering per-transaction writes and flushing them,
//!   idempotently, into a [`TableStore`] at commit
//! - A [`Recovery`] facade chaining the three
//!
//! ## Example
//!
//! ```rust
//! use walredo_core::{Recovery, RecoveryConfig};
//! use walredo_storage::{InMemoryTable, InitialData, RowId, TableStore, Value};
//!
//! let initial = InitialData::from_json_str(r#"{"INITIAL": {"A": [20, 20]}}"#).unwrap();
//! let mut table = InMemoryTable::from_initial(&initial).unwrap();
//!
//! let log = "<start T1>\n<T1,1,A,25>\n<commit T1>\n<crash>\n";
//! let report = Recovery::new(RecoveryConfig::default()).run(log, &mut table).unwrap();
//!
//! assert_eq!(report.succeeded().count(), 1);
//! assert_eq!(table.read("A", RowId::new(1)).unwrap(), Value::Integer(25));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod recovery;
mod types;
mod wal;

pub use config::RecoveryConfig;
pub use error::{CoreError, CoreResult};
pub use recovery::{
    analyze, CheckpointAnalysis, PendingChangeSet, Recovery, RecoveryReport, RedoEngine,
    RedoEvent,
};
pub use types::TransactionId;
pub use wal::{parse_log, LogParser, LogRecord, LogRecordType};

pub use walredo_storage::{RowId, TableStore, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
