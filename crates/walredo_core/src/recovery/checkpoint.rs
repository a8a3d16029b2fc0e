//! Checkpoint analysis.
//!
//! Decides which transactions are not guaranteed durable and the first record
//! the redo engine has to look at. Everything is computed from the last
//! checkpoint before the crash marker:
//!
//! - **No checkpoint**: every started transaction is replayed from record 0.
//! - **Checkpoint listing active transactions**: exactly those are replayed,
//!   starting at the earliest of their `Start` records.
//! - **Empty checkpoint**: every transaction started after the checkpoint is
//!   replayed, starting at the earliest such `Start`.
//!
//! A listed id with no `Start` before the checkpoint is kept in the
//! not-durable set but does not constrain the start position.

use crate::types::TransactionId;
use crate::wal::LogRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of checkpoint analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointAnalysis {
    /// Position of the checkpoint used, if any.
    pub checkpoint: Option<usize>,
    /// Transactions whose writes must be replayed.
    pub not_durable: BTreeSet<TransactionId>,
    /// First record position the redo engine examines.
    pub start_index: usize,
    /// One past the last replayable record: the crash position or the log length.
    pub end_index: usize,
    /// Checkpointed ids that have no earlier `Start` record.
    pub unresolved: BTreeSet<TransactionId>,
}

impl CheckpointAnalysis {
    /// Returns `true` if records of `txid` must be replayed.
    #[must_use]
    pub fn is_not_durable(&self, txid: &TransactionId) -> bool {
        self.not_durable.contains(txid)
    }

    /// Returns the replay window as a range of record positions.
    #[must_use]
    pub fn replay_range(&self) -> std::ops::Range<usize> {
        self.start_index..self.end_index.max(self.start_index)
    }
}

/// Which `Start` records a backward scan collects.
#[derive(Debug, Clone, Copy)]
enum StartFilter<'a> {
    /// Every transaction.
    Any,
    /// Only the listed transactions; the scan stops once all are found.
    Only(&'a BTreeSet<TransactionId>),
}

impl StartFilter<'_> {
    fn accepts(&self, txid: &TransactionId) -> bool {
        match self {
            Self::Any => true,
            Self::Only(targets) => targets.contains(txid),
        }
    }

    fn satisfied(&self, found: usize) -> bool {
        match self {
            Self::Any => false,
            Self::Only(targets) => found == targets.len(),
        }
    }
}

/// Walks `records[floor..ceiling]` from the back and returns, for every
/// accepted transaction, the position of its most recent `Start`.
fn scan_starts_backward(
    records: &[LogRecord],
    floor: usize,
    ceiling: usize,
    filter: StartFilter<'_>,
) -> BTreeMap<TransactionId, usize> {
    let mut found = BTreeMap::new();
    for position in (floor..ceiling).rev() {
        if filter.satisfied(found.len()) {
            break;
        }
        if let LogRecord::Start { txid } = &records[position] {
            if filter.accepts(txid) && !found.contains_key(txid) {
                found.insert(txid.clone(), position);
            }
        }
    }
    found
}

/// Analyzes a fully parsed log.
///
/// Records after the first crash marker are ignored.
#[must_use]
pub fn analyze(records: &[LogRecord]) -> CheckpointAnalysis {
    let end_index = records
        .iter()
        .position(|r| matches!(r, LogRecord::Crash))
        .unwrap_or(records.len());
    if end_index + 1 < records.len() {
        tracing::warn!(
            crash = end_index,
            ignored = records.len() - end_index - 1,
            "records after crash marker are ignored"
        );
    }

    let last_checkpoint = records[..end_index]
        .iter()
        .enumerate()
        .rev()
        .find_map(|(position, record)| match record {
            LogRecord::Checkpoint { active } => Some((position, active)),
            _ => None,
        });

    let Some((checkpoint, active)) = last_checkpoint else {
        let started = scan_starts_backward(records, 0, end_index, StartFilter::Any);
        tracing::debug!(transactions = started.len(), "no checkpoint, replaying whole log");
        return CheckpointAnalysis {
            checkpoint: None,
            not_durable: started.into_keys().collect(),
            start_index: 0,
            end_index,
            unresolved: BTreeSet::new(),
        };
    };

    let analysis = if active.is_empty() {
        let started =
            scan_starts_backward(records, checkpoint + 1, end_index, StartFilter::Any);
        CheckpointAnalysis {
            checkpoint: Some(checkpoint),
            start_index: started.values().copied().min().unwrap_or(checkpoint + 1),
            not_durable: started.into_keys().collect(),
            end_index,
            unresolved: BTreeSet::new(),
        }
    } else {
        let started = scan_starts_backward(records, 0, checkpoint, StartFilter::Only(active));
        let unresolved: BTreeSet<TransactionId> = active
            .iter()
            .filter(|txid| !started.contains_key(*txid))
            .cloned()
            .collect();
        for txid in &unresolved {
            tracing::warn!(%txid, checkpoint, "checkpointed transaction has no start record");
        }
        CheckpointAnalysis {
            checkpoint: Some(checkpoint),
            not_durable: active.clone(),
            start_index: started.values().copied().min().unwrap_or(checkpoint + 1),
            end_index,
            unresolved,
        }
    };

    tracing::debug!(
        checkpoint,
        start_index = analysis.start_index,
        not_durable = analysis.not_durable.len(),
        "checkpoint analyzed"
    );
    analysis
}
