//! Test fixtures and table helpers.
//!
//! Provides convenience functions for building logs and seeding tables.

use std::fmt::Display;
use std::path::PathBuf;
use tempfile::TempDir;
use walredo_core::{CoreResult, LogRecord, Recovery, RecoveryReport};
use walredo_storage::{FileTable, InMemoryTable, InitialData, TableStore, Value};

/// Initial data used by most tests: two rows, columns `A` and `B`.
pub const SAMPLE_INITIAL: &str = r#"{"INITIAL": {"A": [20, 20], "B": [55, 30]}}"#;

/// Returns the parsed [`SAMPLE_INITIAL`] document.
pub fn sample_initial() -> InitialData {
    InitialData::from_json_str(SAMPLE_INITIAL).expect("sample initial data is valid")
}

/// Returns an in-memory table seeded with [`SAMPLE_INITIAL`].
pub fn seeded_table() -> InMemoryTable {
    InMemoryTable::from_initial(&sample_initial()).expect("sample initial data is valid")
}

/// Returns an in-memory table with `rows` rows and the given columns, every
/// cell set to 0.
pub fn zeroed_table(columns: &[&str], rows: usize) -> InMemoryTable {
    let initial = InitialData {
        columns: columns
            .iter()
            .map(|c| (c.to_string(), vec![Value::Integer(0); rows]))
            .collect(),
    };
    InMemoryTable::from_initial(&initial).expect("columns have equal length")
}

/// Runs a default recovery pass.
pub fn recover(log: &str, store: &mut dyn TableStore) -> CoreResult<RecoveryReport> {
    Recovery::default().run(log, store)
}

/// Builds log text record by record.
///
/// # Example
///
/// ```rust
/// use walredo_testkit::LogBuilder;
///
/// let log = LogBuilder::new()
///     .start("T1")
///     .write("T1", 1, "A", 25)
///     .checkpoint(["T1"])
///     .commit("T1")
///     .crash()
///     .build();
/// assert!(log.starts_with("<start T1>\n"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogBuilder {
    records: Vec<LogRecord>,
}

impl LogBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a start record.
    pub fn start(mut self, txid: &str) -> Self {
        self.records.push(LogRecord::start(txid));
        self
    }

    /// Appends a write record.
    pub fn write(mut self, txid: &str, row: u64, column: &str, value: impl Display) -> Self {
        self.records
            .push(LogRecord::write(txid, row, column, value.to_string()));
        self
    }

    /// Appends a commit record.
    pub fn commit(mut self, txid: &str) -> Self {
        self.records.push(LogRecord::commit(txid));
        self
    }

    /// Appends a checkpoint record.
    pub fn checkpoint<'a>(mut self, active: impl IntoIterator<Item = &'a str>) -> Self {
        self.records.push(LogRecord::checkpoint(active));
        self
    }

    /// Appends a crash marker.
    pub fn crash(mut self) -> Self {
        self.records.push(LogRecord::Crash);
        self
    }

    /// Appends an arbitrary record.
    pub fn record(mut self, record: LogRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Returns the records appended so far.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Renders the log text, one record per line.
    pub fn build(&self) -> String {
        self.records.iter().map(|r| format!("{r}\n")).collect()
    }
}

/// A file-backed table in a temporary directory.
pub struct TempTable {
    /// The table.
    pub table: FileTable,
    /// The temporary directory (kept alive to prevent cleanup).
    dir: TempDir,
}

impl TempTable {
    /// Creates a file table seeded with [`SAMPLE_INITIAL`] and flushed.
    pub fn seeded() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let mut table =
            FileTable::open(&dir.path().join("table.json")).expect("Failed to open table");
        table.seed(&sample_initial()).expect("Failed to seed table");
        table.flush().expect("Failed to flush table");
        Self { table, dir }
    }

    /// Returns the table file path.
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("table.json")
    }

    /// Writes `text` to a log file in the same directory and returns its path.
    pub fn write_log(&self, text: &str) -> PathBuf {
        let path = self.dir.path().join("log.txt");
        std::fs::write(&path, text).expect("Failed to write log");
        path
    }

    /// Reopens the table from disk.
    pub fn reopen(&self) -> FileTable {
        FileTable::open(&self.path()).expect("Failed to reopen table")
    }
}

impl std::ops::Deref for TempTable {
    type Target = FileTable;

    fn deref(&self) -> &Self::Target {
        &self.table
    }
}

impl std::ops::DerefMut for TempTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.table
    }
}
