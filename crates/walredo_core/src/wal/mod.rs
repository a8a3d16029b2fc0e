//! Textual write-ahead log: record types and parsing.
//!
//! ## Line Format
//!
//! Every record occupies one line wrapped in a delimiter pair (angle
//! brackets by default). Blank lines are skipped.
//!
//! ```text
//! <start T1>            transaction start
//! <T1,1,A,25>           write: txid, row, column, value
//! <commit T1>           transaction commit
//! <CKPT (T2,T3)>        checkpoint listing active transactions (may be empty)
//! <crash>               crash marker
//! ```
//!
//! ## Parse Policy
//!
//! Any malformed line is fatal: the whole log is rejected with
//! [`crate::CoreError::Parse`] before a single record reaches the redo engine.
//! Write values are kept as opaque tokens; typing them is the store's job.

mod parser;
mod record;

pub use parser::{parse_log, LogParser};
pub use record::{LogRecord, LogRecordType};
