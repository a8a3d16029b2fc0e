//! REDO recovery: checkpoint analysis, forward replay and the facade tying
//! them to the parser.
//!
//! ## Pipeline
//!
//! ```text
//! log text --parse--> [LogRecord] --analyze--> CheckpointAnalysis
//!                          |                          |
//!                          +---------> RedoEngine <---+
//!                                         |
//!                                    TableStore
//! ```
//!
//! The analyzer sees the whole parsed log before the engine starts, because
//! it scans backward from the end.
//!
//! ## Invariants
//!
//! - Only **committed** not-durable transactions reach the store
//! - Replay is **idempotent** - cells already holding the logged value are
//!   not rewritten
//! - Nothing after the crash marker is replayed
//! - A store miss is **fatal** - corruption is never skipped over

mod checkpoint;
mod replay;
mod report;

pub use checkpoint::{analyze, CheckpointAnalysis};
pub use replay::{PendingChangeSet, RedoEngine};
pub use report::{RecoveryReport, RedoEvent};

use crate::config::RecoveryConfig;
use crate::error::CoreResult;
use crate::wal::{LogParser, LogRecord};
use std::path::Path;
use walredo_storage::TableStore;

/// Runs complete recovery passes with one configuration.
///
/// # Example
///
/// ```rust
/// use walredo_core::{Recovery, RecoveryConfig};
/// use walredo_storage::{InMemoryTable, InitialData};
///
/// let initial = InitialData::from_json_str(r#"{"INITIAL": {"A": [1]}}"#).unwrap();
/// let mut table = InMemoryTable::from_initial(&initial).unwrap();
/// let recovery = Recovery::new(RecoveryConfig::default());
///
/// let report = recovery.run("<start T1>\n<T1,1,A,2>\n<crash>\n", &mut table).unwrap();
/// assert_eq!(report.not_completed().count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Recovery {
    config: RecoveryConfig,
}

impl Recovery {
    /// Creates a recovery runner.
    #[must_use]
    pub fn new(config: RecoveryConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Parses log text with the configured delimiters.
    ///
    /// # Errors
    ///
    /// Returns a parse error for the first malformed line.
    pub fn parse(&self, text: &str) -> CoreResult<Vec<LogRecord>> {
        let (open, close) = self.config.delimiters;
        LogParser::new(open, close).parse(text)
    }

    /// Parses and analyzes log text without touching any store.
    ///
    /// # Errors
    ///
    /// Returns a parse error for the first malformed line.
    pub fn analyze(&self, text: &str) -> CoreResult<(Vec<LogRecord>, CheckpointAnalysis)> {
        let records = self.parse(text)?;
        let analysis = analyze(&records);
        Ok((records, analysis))
    }

    /// Parses, analyzes and replays `text` into `store`.
    ///
    /// # Errors
    ///
    /// Parse errors abort before any replay. Store misses abort the pass.
    pub fn run(&self, text: &str, store: &mut dyn TableStore) -> CoreResult<RecoveryReport> {
        let records = self.parse(text)?;
        self.run_records(&records, store)
    }

    /// Reads the log at `path` and runs a pass over it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or as [`Recovery::run`].
    pub fn run_file(&self, path: &Path, store: &mut dyn TableStore) -> CoreResult<RecoveryReport> {
        let text = std::fs::read_to_string(path)?;
        tracing::info!(path = %path.display(), bytes = text.len(), "log loaded");
        self.run(&text, store)
    }

    /// Analyzes and replays already parsed records into `store`.
    ///
    /// # Errors
    ///
    /// Store misses abort the pass; flush failures are returned as storage errors.
    pub fn run_records(
        &self,
        records: &[LogRecord],
        store: &mut dyn TableStore,
    ) -> CoreResult<RecoveryReport> {
        let analysis = analyze(records);
        let report = RedoEngine::new(store)
            .dry_run(self.config.dry_run)
            .replay(records, &analysis)?;

        if self.config.flush_on_complete && !self.config.dry_run {
            store.flush()?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::TransactionId;
    use walredo_storage::{FileTable, InMemoryTable, InitialData, RowId, Value};

    fn initial() -> InitialData {
        InitialData::from_json_str(r#"{"INITIAL": {"A": [20, 20], "B": [55, 30]}}"#).unwrap()
    }

    const LOG: &str = "\
<start T1>
<T1,1,A,25>
<commit T1>
<CKPT ()>
<start T2>
<T2,2,B,31>
<commit T2>
<start T3>
<T3,1,B,0>
<crash>
";

    #[test]
    fn run_reports_both_outcomes() {
        let mut table = InMemoryTable::from_initial(&initial()).unwrap();
        let report = Recovery::default().run(LOG, &mut table).unwrap();

        assert_eq!(
            report.succeeded().collect::<Vec<_>>(),
            vec![&TransactionId::new("T2")]
        );
        assert_eq!(
            report.not_completed().collect::<Vec<_>>(),
            vec![&TransactionId::new("T3")]
        );
        assert_eq!(table.read("A", RowId::new(1)).unwrap(), Value::Integer(20));
        assert_eq!(table.read("B", RowId::new(2)).unwrap(), Value::Integer(31));
        assert_eq!(table.read("B", RowId::new(1)).unwrap(), Value::Integer(55));
    }

    #[test]
    fn parse_error_prevents_any_write() {
        let mut table = InMemoryTable::from_initial(&initial()).unwrap();
        let log = "<start T1>\n<T1,1,A,25>\n<commit T1>\n<T2,1>\n";
        let err = Recovery::default().run(log, &mut table).unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 4, .. }));
        assert_eq!(table.write_count(), 0);
    }

    #[test]
    fn custom_delimiters_from_config() {
        let mut table = InMemoryTable::from_initial(&initial()).unwrap();
        let recovery = Recovery::new(RecoveryConfig::new().delimiters('[', ']'));
        let report = recovery
            .run("[start T1]\n[T1,1,A,1]\n[commit T1]\n", &mut table)
            .unwrap();
        assert_eq!(report.writes_applied, 1);
    }

    #[test]
    fn analyze_only() {
        let (records, analysis) = Recovery::default().analyze(LOG).unwrap();
        assert_eq!(records.len(), 10);
        assert_eq!(analysis.checkpoint, Some(3));
        assert_eq!(analysis.start_index, 4);
    }

    #[test]
    fn run_file_and_flush() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("log.txt");
        let table_path = dir.path().join("table.json");
        std::fs::write(&log_path, LOG).unwrap();

        {
            let mut table = FileTable::open(&table_path).unwrap();
            table.seed(&initial()).unwrap();
            Recovery::default().run_file(&log_path, &mut table).unwrap();
            assert!(!table.is_dirty());
        }

        let table = FileTable::open(&table_path).unwrap();
        assert_eq!(table.read("B", RowId::new(2)).unwrap(), Value::Integer(31));
    }

    #[test]
    fn dry_run_does_not_flush() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("table.json");
        let mut table = FileTable::open(&table_path).unwrap();
        table.seed(&initial()).unwrap();

        let report = Recovery::new(RecoveryConfig::new().dry_run(true))
            .run(LOG, &mut table)
            .unwrap();
        assert_eq!(report.writes_applied, 1);
        assert!(table.is_dirty());
        assert!(!table_path.exists());
    }

    #[test]
    fn flush_disabled_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("table.json");
        let mut table = FileTable::open(&table_path).unwrap();
        table.seed(&initial()).unwrap();
        table.flush().unwrap();

        let report = Recovery::new(RecoveryConfig::new().flush_on_complete(false))
            .run(LOG, &mut table)
            .unwrap();
        assert_eq!(report.writes_applied, 1);
        assert!(table.is_dirty());
        assert_eq!(table.read("B", RowId::new(2)).unwrap(), Value::Integer(31));

        let reopened = FileTable::open(&table_path).unwrap();
        assert_eq!(reopened.read("B", RowId::new(2)).unwrap(), Value::Integer(30));
    }

    #[test]
    fn malformed_start_id_prevents_any_write() {
        let mut table = InMemoryTable::from_initial(&initial()).unwrap();
        let log = "<start T1,1,A,5>\n<T1,1,A,6>\n<commit T1>\n";
        let err = Recovery::default().run(log, &mut table).unwrap_err();
        assert!(matches!(err, CoreError::Parse { line: 1, .. }));
        assert_eq!(table.write_count(), 0);
    }

    #[test]
    fn report_serializes_to_json() {
        let mut table = InMemoryTable::from_initial(&initial()).unwrap();
        let report = Recovery::default().run(LOG, &mut table).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["events"][0]["outcome"], "succeeded");
        assert_eq!(json["events"][0]["txid"], "T2");
        assert_eq!(json["events"][1]["outcome"], "not_completed");
        assert_eq!(json["analysis"]["not_durable"][0], "T2");
    }

    #[test]
    fn missing_log_file_is_io_error() {
        let mut table = InMemoryTable::new();
        let err = Recovery::default()
            .run_file(Path::new("/nonexistent/walredo/log"), &mut table)
            .unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
