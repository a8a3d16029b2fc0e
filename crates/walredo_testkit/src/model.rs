//! Reference model of the redo pass.
//!
//! A direct forward reading of the recovery rules, with no window
//! arithmetic, used as an oracle for the engine in property tests.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use walredo_core::{LogRecord, TransactionId};
use walredo_storage::{RowId, StorageResult, TableData, Value};

/// What a redo pass over a log should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutcome {
    /// Transactions the pass must consider.
    pub not_durable: BTreeSet<TransactionId>,
    /// Not-durable transactions that commit, in commit order.
    pub committed: Vec<TransactionId>,
    /// Not-durable transactions with records but no commit.
    pub incomplete: BTreeSet<TransactionId>,
    /// Table contents after the pass.
    pub table: TableData,
}

/// Computes the expected outcome of recovering `records` onto `initial`.
///
/// # Errors
///
/// Returns a storage error if a committed write names a missing cell.
pub fn expected_outcome(records: &[LogRecord], initial: &TableData) -> StorageResult<ModelOutcome> {
    let live = match records.iter().position(|r| matches!(r, LogRecord::Crash)) {
        Some(crash) => &records[..crash],
        None => records,
    };

    let mut last_checkpoint = None;
    for (position, record) in live.iter().enumerate() {
        if let LogRecord::Checkpoint { active } = record {
            last_checkpoint = Some((position, active));
        }
    }

    let started_after = |floor: usize| -> BTreeSet<TransactionId> {
        live.iter()
            .skip(floor)
            .filter_map(|r| match r {
                LogRecord::Start { txid } => Some(txid.clone()),
                _ => None,
            })
            .collect()
    };
    let not_durable = match last_checkpoint {
        None => started_after(0),
        Some((position, active)) if active.is_empty() => started_after(position + 1),
        Some((_, active)) => active.clone(),
    };

    let mut table = initial.clone();
    let mut buffered: BTreeMap<TransactionId, BTreeMap<(String, RowId), String>> = BTreeMap::new();
    let mut seen: BTreeSet<TransactionId> = BTreeSet::new();
    let mut done: HashSet<TransactionId> = HashSet::new();
    let mut committed = Vec::new();

    for record in live {
        match record {
            LogRecord::Start { txid } if not_durable.contains(txid) => {
                seen.insert(txid.clone());
            }
            LogRecord::Write {
                txid,
                row,
                column,
                value,
            } if not_durable.contains(txid) => {
                seen.insert(txid.clone());
                buffered
                    .entry(txid.clone())
                    .or_default()
                    .insert((column.clone(), *row), value.clone());
            }
            LogRecord::Commit { txid } if not_durable.contains(txid) => {
                if !done.insert(txid.clone()) {
                    continue;
                }
                for ((column, row), token) in buffered.remove(txid).unwrap_or_default() {
                    table.set(&column, row, Value::coerce(&token))?;
                }
                committed.push(txid.clone());
            }
            _ => {}
        }
    }

    let incomplete = seen.into_iter().filter(|t| !done.contains(t)).collect();
    Ok(ModelOutcome {
        not_durable,
        committed,
        incomplete,
        table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_initial, LogBuilder};

    fn initial() -> TableData {
        TableData::from_initial(&sample_initial()).unwrap()
    }

    #[test]
    fn model_applies_last_write() {
        let log = LogBuilder::new()
            .start("T1")
            .write("T1", 1, "A", 1)
            .write("T1", 1, "A", 2)
            .commit("T1");
        let outcome = expected_outcome(log.records(), &initial()).unwrap();
        assert_eq!(outcome.table.get("A", RowId::new(1)).unwrap(), &Value::Integer(2));
        assert_eq!(outcome.committed, vec![TransactionId::new("T1")]);
    }

    #[test]
    fn model_ignores_durable_transactions() {
        let log = LogBuilder::new()
            .start("T1")
            .write("T1", 1, "A", 1)
            .commit("T1")
            .checkpoint(Vec::<&str>::new())
            .start("T2")
            .write("T2", 2, "B", "NULL");
        let outcome = expected_outcome(log.records(), &initial()).unwrap();
        assert_eq!(outcome.table.get("A", RowId::new(1)).unwrap(), &Value::Integer(20));
        assert_eq!(outcome.incomplete, [TransactionId::new("T2")].into_iter().collect());
    }
}
