//! # walredo Storage
//!
//! Table store trait and implementations for walredo.
//!
//! This crate is the persistent side of a redo pass: a single table of named
//! columns addressed by row id. The recovery engine only ever reads one cell,
//! compares it with the logged value and writes it back when they differ, so
//! the contract here is deliberately small.
//!
//! ## Design Principles
//!
//! - Stores know nothing about log records, checkpoints or transactions
//! - A missing row or column is an error, never a silent no-op
//! - Log values arrive as opaque tokens; [`Value::coerce`] types them
//!
//! ## Available Stores
//!
//! - [`InMemoryTable`] - For testing and ephemeral runs
//! - [`FileTable`] - JSON document on disk, rewritten atomically on flush
//!
//! ## Example
//!
//! ```rust
//! use walredo_storage::{InMemoryTable, InitialData, RowId, TableStore, Value};
//!
//! let initial = InitialData::from_json_str(r#"{"INITIAL": {"A": [20, 30]}}"#).unwrap();
//! let mut table = InMemoryTable::new();
//! table.seed(&initial).unwrap();
//! table.write("A", RowId::new(1), Value::Integer(25)).unwrap();
//! assert_eq!(table.read("A", RowId::new(1)).unwrap(), Value::Integer(25));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod seed;
mod table;
mod value;

pub use error::{StorageError, StorageResult};
pub use file::FileTable;
pub use memory::InMemoryTable;
pub use seed::InitialData;
pub use table::{RowId, TableData, TableStore};
pub use value::Value;
