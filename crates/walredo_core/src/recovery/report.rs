//! Recovery outcome reporting.

use crate::recovery::checkpoint::CheckpointAnalysis;
use crate::types::TransactionId;
use serde::Serialize;

/// Terminal outcome of one transaction in a redo pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RedoEvent {
    /// The transaction's commit was reached and its writes flushed.
    Succeeded {
        /// Transaction ID.
        txid: TransactionId,
        /// Position of the commit record.
        position: usize,
        /// Writes that changed the store.
        applied: usize,
        /// Writes skipped because the store already held the value.
        skipped: usize,
    },

    /// The pass ended before the transaction committed.
    NotCompleted {
        /// Transaction ID.
        txid: TransactionId,
        /// Buffered writes that were discarded.
        pending: usize,
    },
}

impl RedoEvent {
    /// Returns the transaction this event is about.
    #[must_use]
    pub fn txid(&self) -> &TransactionId {
        match self {
            Self::Succeeded { txid, .. } | Self::NotCompleted { txid, .. } => txid,
        }
    }

    /// Returns `true` for [`RedoEvent::Succeeded`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Summary of a redo pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// Checkpoint analysis the pass ran with.
    pub analysis: CheckpointAnalysis,
    /// Outcomes in emission order: successes at their commit, then
    /// incomplete transactions once the pass ended.
    pub events: Vec<RedoEvent>,
    /// Records the engine looked at.
    pub records_examined: usize,
    /// Store writes performed (or that would be performed in a dry run).
    pub writes_applied: usize,
    /// Buffered writes that matched the store already.
    pub writes_skipped: usize,
    /// Whether store writes were suppressed.
    pub dry_run: bool,
}

impl RecoveryReport {
    /// Transactions whose redo succeeded, in commit order.
    pub fn succeeded(&self) -> impl Iterator<Item = &TransactionId> {
        self.events
            .iter()
            .filter(|e| e.is_success())
            .map(RedoEvent::txid)
    }

    /// Transactions whose redo did not complete.
    pub fn not_completed(&self) -> impl Iterator<Item = &TransactionId> {
        self.events
            .iter()
            .filter(|e| !e.is_success())
            .map(RedoEvent::txid)
    }

    /// Returns `true` if every replayed transaction committed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.events.iter().all(RedoEvent::is_success)
    }
}
