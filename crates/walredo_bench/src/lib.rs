//! Benchmark utilities for walredo.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::Rng;
use walredo_core::LogRecord;
use walredo_storage::{InMemoryTable, InitialData, Value};

/// Columns used by generated workloads.
pub const COLUMNS: [&str; 4] = ["A", "B", "C", "D"];

/// Shape of a generated log.
#[derive(Debug, Clone, Copy)]
pub struct Workload {
    /// Number of transactions started.
    pub transactions: usize,
    /// Writes per transaction.
    pub writes_per_txn: usize,
    /// Rows in the target table.
    pub rows: u64,
    /// A checkpoint is emitted every this many transactions (0 disables).
    pub checkpoint_every: usize,
    /// Share of transactions left uncommitted, in percent.
    pub abort_percent: u32,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            transactions: 1000,
            writes_per_txn: 4,
            rows: 256,
            checkpoint_every: 100,
            abort_percent: 5,
        }
    }
}

/// Generates a random log for `workload`, ending in a crash marker.
///
/// Transactions run one after another, except that each checkpoint is taken
/// while the current transaction is still open.
pub fn generate_log(workload: &Workload) -> Vec<LogRecord> {
    let mut rng = rand::thread_rng();
    let mut records =
        Vec::with_capacity(workload.transactions * (workload.writes_per_txn + 2) + 1);

    for n in 0..workload.transactions {
        let txid = format!("T{n}");
        records.push(LogRecord::start(txid.as_str()));
        for _ in 0..workload.writes_per_txn {
            let column = COLUMNS[rng.gen_range(0..COLUMNS.len())];
            let row = rng.gen_range(1..=workload.rows);
            let value: i64 = rng.gen_range(0..1000);
            records.push(LogRecord::write(txid.as_str(), row, column, value.to_string()));
        }
        if workload.checkpoint_every > 0 && n % workload.checkpoint_every == 0 {
            records.push(LogRecord::checkpoint([txid.as_str()]));
        }
        if rng.gen_range(0..100) >= workload.abort_percent {
            records.push(LogRecord::commit(txid));
        }
    }

    records.push(LogRecord::Crash);
    records
}

/// Renders records as log text.
pub fn render(records: &[LogRecord]) -> String {
    records.iter().map(|r| format!("{r}\n")).collect()
}

/// Initial data with `rows` zeroed rows over [`COLUMNS`].
pub fn initial_data(rows: u64) -> InitialData {
    InitialData {
        columns: COLUMNS
            .iter()
            .map(|c| (c.to_string(), vec![Value::Integer(0); rows as usize]))
            .collect(),
    }
}

/// An in-memory table matching [`initial_data`].
pub fn zeroed_table(rows: u64) -> InMemoryTable {
    InMemoryTable::from_initial(&initial_data(rows)).expect("columns have equal length")
}
