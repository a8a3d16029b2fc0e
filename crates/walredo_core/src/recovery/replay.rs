//! Forward redo replay.

use crate::error::{CoreError, CoreResult};
use crate::recovery::checkpoint::CheckpointAnalysis;
use crate::recovery::report::{RecoveryReport, RedoEvent};
use crate::types::TransactionId;
use crate::wal::LogRecord;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use walredo_storage::{RowId, TableStore, Value};

/// Writes buffered for one transaction: column -> row -> value.
///
/// A later write to the same `(column, row)` replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChangeSet {
    changes: BTreeMap<String, BTreeMap<RowId, String>>,
}

impl PendingChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers a write, replacing any earlier value for the same cell.
    pub fn record(&mut self, column: &str, row: RowId, value: &str) {
        self.changes
            .entry(column.to_string())
            .or_default()
            .insert(row, value.to_string());
    }

    /// Returns the buffered value for a cell.
    #[must_use]
    pub fn get(&self, column: &str, row: RowId) -> Option<&str> {
        self.changes.get(column)?.get(&row).map(String::as_str)
    }

    /// Number of distinct cells buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates `(column, row, value)` in column then row order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, RowId, &str)> {
        self.changes.iter().flat_map(|(column, rows)| {
            rows.iter()
                .map(move |(row, value)| (column.as_str(), *row, value.as_str()))
        })
    }
}

/// Replays not-durable transactions from a parsed log into a store.
///
/// The engine owns all per-pass state; nothing survives a call to
/// [`RedoEngine::replay`] except the store mutations and the returned report.
///
/// # Idempotence
///
/// At commit every buffered value is compared with the store and only
/// differing cells are written, so replaying the same log against a store
/// that already holds its effects performs no writes.
pub struct RedoEngine<'s> {
    store: &'s mut dyn TableStore,
    dry_run: bool,
    /// Values a dry run would have written, consulted before the store.
    overlay: HashMap<(String, RowId), Value>,
}

impl<'s> RedoEngine<'s> {
    /// Creates an engine writing into `store`.
    pub fn new(store: &'s mut dyn TableStore) -> Self {
        Self {
            store,
            dry_run: false,
            overlay: HashMap::new(),
        }
    }

    /// Sets whether store writes are suppressed.
    #[must_use]
    pub fn dry_run(mut self, value: bool) -> Self {
        self.dry_run = value;
        self
    }

    /// Runs one redo pass over `records[analysis.start_index..analysis.end_index]`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Replay`] if the store does not contain a logged
    /// row or column; the pass stops there. Returns
    /// [`CoreError::InvalidOperation`] if `analysis` does not fit `records`.
    pub fn replay(
        &mut self,
        records: &[LogRecord],
        analysis: &CheckpointAnalysis,
    ) -> CoreResult<RecoveryReport> {
        let window = records.get(analysis.replay_range()).ok_or_else(|| {
            CoreError::invalid_operation(format!(
                "replay window {:?} exceeds log of {} records",
                analysis.replay_range(),
                records.len()
            ))
        })?;

        self.overlay.clear();
        let mut pending: HashMap<TransactionId, PendingChangeSet> = HashMap::new();
        let mut incomplete: BTreeSet<TransactionId> = BTreeSet::new();
        let mut committed: HashSet<TransactionId> = HashSet::new();
        let mut report = RecoveryReport {
            analysis: analysis.clone(),
            events: Vec::new(),
            records_examined: 0,
            writes_applied: 0,
            writes_skipped: 0,
            dry_run: self.dry_run,
        };

        for (offset, record) in window.iter().enumerate() {
            let position = analysis.start_index + offset;
            report.records_examined += 1;

            match record {
                LogRecord::Start { txid } if analysis.is_not_durable(txid) => {
                    tracing::debug!(%txid, position, "replaying start");
                    pending.entry(txid.clone()).or_default();
                    incomplete.insert(txid.clone());
                }
                LogRecord::Write {
                    txid,
                    row,
                    column,
                    value,
                } if analysis.is_not_durable(txid) => {
                    tracing::debug!(
                        %txid,
                        %row,
                        column = column.as_str(),
                        value = value.as_str(),
                        position,
                        "buffering write"
                    );
                    pending
                        .entry(txid.clone())
                        .or_default()
                        .record(column, *row, value);
                    incomplete.insert(txid.clone());
                }
                LogRecord::Commit { txid } if analysis.is_not_durable(txid) => {
                    if !committed.insert(txid.clone()) {
                        tracing::warn!(%txid, position, "duplicate commit ignored");
                        continue;
                    }
                    let changes = pending.remove(txid).unwrap_or_default();
                    let (applied, skipped) = self.flush_commit(position, txid, &changes)?;
                    incomplete.remove(txid);
                    report.writes_applied += applied;
                    report.writes_skipped += skipped;
                    tracing::info!(%txid, position, applied, skipped, "redo succeeded");
                    report.events.push(RedoEvent::Succeeded {
                        txid: txid.clone(),
                        position,
                        applied,
                        skipped,
                    });
                }
                LogRecord::Crash => break,
                _ => {
                    tracing::trace!(position, kind = %record.record_type(), "skipped");
                }
            }
        }

        for txid in incomplete {
            let discarded = pending.get(&txid).map_or(0, PendingChangeSet::len);
            tracing::warn!(%txid, discarded, "redo not completed");
            report.events.push(RedoEvent::NotCompleted {
                txid,
                pending: discarded,
            });
        }

        tracing::info!(
            examined = report.records_examined,
            applied = report.writes_applied,
            skipped = report.writes_skipped,
            "redo pass finished"
        );
        Ok(report)
    }

    /// Writes every buffered cell that differs from the store.
    ///
    /// Returns `(applied, skipped)`.
    fn flush_commit(
        &mut self,
        position: usize,
        txid: &TransactionId,
        changes: &PendingChangeSet,
    ) -> CoreResult<(usize, usize)> {
        let mut applied = 0;
        let mut skipped = 0;

        for (column, row, token) in changes.iter() {
            let value = Value::coerce(token);
            let key = (column.to_string(), row);
            let current = match self.overlay.get(&key) {
                Some(v) => v.clone(),
                None => self
                    .store
                    .read(column, row)
                    .map_err(|e| CoreError::replay(position, txid, e))?,
            };

            if current == value {
                skipped += 1;
                continue;
            }

            if self.dry_run {
                self.overlay.insert(key, value);
            } else {
                self.store
                    .write(column, row, value)
                    .map_err(|e| CoreError::replay(position, txid, e))?;
            }
            applied += 1;
        }

        Ok((applied, skipped))
    }
}
