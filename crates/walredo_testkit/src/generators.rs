//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random logs that stay well formed:
//! every transaction starts once, writes only while open, commits at most
//! once, and checkpoints list exactly the open transactions.

use proptest::prelude::*;
use proptest::sample::Index;
use walredo_core::LogRecord;

/// Columns written by generated logs.
pub const GENERATED_COLUMNS: [&str; 3] = ["A", "B", "C"];

/// Number of rows written by generated logs.
pub const GENERATED_ROWS: u64 = 4;

/// One step of a generated workload.
#[derive(Debug, Clone)]
pub enum LogOp {
    /// Start a new transaction
    Start,
    /// Write to an open transaction
    Write {
        /// Picks the open transaction
        slot: Index,
        /// Row id (1-based)
        row: u64,
        /// Index into [`GENERATED_COLUMNS`]
        column: usize,
        /// Value token
        value: String,
    },
    /// Commit an open transaction
    Commit {
        /// Picks the open transaction
        slot: Index,
    },
    /// Checkpoint listing the open transactions
    Checkpoint,
}

/// Strategy for value tokens: integers, `NULL` and short text.
pub fn value_token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => (0i64..50).prop_map(|n| n.to_string()),
        1 => Just("NULL".to_string()),
        2 => (0u8..5).prop_map(|n| format!("v{n}")),
    ]
}

/// Strategy for a single workload step.
pub fn log_op_strategy() -> impl Strategy<Value = LogOp> {
    prop_oneof![
        2 => Just(LogOp::Start),
        5 => (
            any::<Index>(),
            1..=GENERATED_ROWS,
            0..GENERATED_COLUMNS.len(),
            value_token_strategy()
        )
            .prop_map(|(slot, row, column, value)| LogOp::Write {
                slot,
                row,
                column,
                value
            }),
        2 => any::<Index>().prop_map(|slot| LogOp::Commit { slot }),
        1 => Just(LogOp::Checkpoint),
    ]
}

/// A generated log.
#[derive(Debug, Clone)]
pub struct GeneratedLog {
    /// The records, in log order.
    pub records: Vec<LogRecord>,
}

impl GeneratedLog {
    /// Interprets a workload into log records.
    ///
    /// A write or commit with no open transaction starts one first. With
    /// `crash` set a crash marker is appended, followed by `trailing`
    /// records that recovery must ignore.
    pub fn from_ops(ops: &[LogOp], crash: bool, trailing: &[LogOp]) -> Self {
        let mut builder = Interpreter::default();
        for op in ops {
            builder.apply(op);
        }
        if crash {
            builder.records.push(LogRecord::Crash);
            for op in trailing {
                builder.apply(op);
            }
        }
        Self {
            records: builder.records,
        }
    }

    /// Renders the log text.
    pub fn text(&self) -> String {
        self.records.iter().map(|r| format!("{r}\n")).collect()
    }
}

#[derive(Default)]
struct Interpreter {
    records: Vec<LogRecord>,
    open: Vec<String>,
    next_id: usize,
}

impl Interpreter {
    fn start(&mut self) -> String {
        self.next_id += 1;
        let txid = format!("T{}", self.next_id);
        self.records.push(LogRecord::start(txid.as_str()));
        self.open.push(txid.clone());
        txid
    }

    fn pick(&mut self, slot: &Index) -> usize {
        if self.open.is_empty() {
            self.start();
        }
        slot.index(self.open.len())
    }

    fn apply(&mut self, op: &LogOp) {
        match op {
            LogOp::Start => {
                self.start();
            }
            LogOp::Write {
                slot,
                row,
                column,
                value,
            } => {
                let i = self.pick(slot);
                self.records.push(LogRecord::write(
                    self.open[i].as_str(),
                    *row,
                    GENERATED_COLUMNS[*column],
                    value.as_str(),
                ));
            }
            LogOp::Commit { slot } => {
                let i = self.pick(slot);
                let txid = self.open.remove(i);
                self.records.push(LogRecord::commit(txid));
            }
            LogOp::Checkpoint => {
                self.records
                    .push(LogRecord::checkpoint(self.open.iter().map(String::as_str)));
            }
        }
    }
}

/// Strategy for well-formed logs, with or without a crash marker.
pub fn generated_log_strategy(max_ops: usize) -> impl Strategy<Value = GeneratedLog> {
    (
        prop::collection::vec(log_op_strategy(), 1..max_ops.max(2)),
        any::<bool>(),
        prop::collection::vec(log_op_strategy(), 0..4),
    )
        .prop_map(|(ops, crash, trailing)| GeneratedLog::from_ops(&ops, crash, &trailing))
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
