//! End-to-end recovery tests: fixed scenarios plus property checks against
//! the reference model.

use proptest::prelude::*;
use std::collections::BTreeSet;
use walredo_core::{
    analyze, parse_log, CoreError, Recovery, RecoveryConfig, RedoEvent, RowId, TableStore,
    TransactionId, Value,
};
use walredo_storage::{InMemoryTable, TableData};
use walredo_testkit::prelude::*;

fn ids(list: &[&str]) -> BTreeSet<TransactionId> {
    list.iter().map(|s| TransactionId::new(*s)).collect()
}

fn generated_table() -> InMemoryTable {
    zeroed_table(&GENERATED_COLUMNS, GENERATED_ROWS as usize)
}

#[test]
fn checkpoint_start_index_is_earliest_active_start() {
    let log = LogBuilder::new()
        .start("T0")
        .write("T0", 1, "A", 1)
        .commit("T0")
        .start("T9")
        .commit("T9")
        .start("T1")
        .write("T1", 2, "B", 7)
        .checkpoint(["T1"])
        .commit("T1")
        .build();

    let (_, analysis) = Recovery::default().analyze(&log).unwrap();
    assert_eq!(analysis.checkpoint, Some(7));
    assert_eq!(analysis.start_index, 5);
    assert_eq!(analysis.not_durable, ids(&["T1"]));

    let mut table = seeded_table();
    let report = recover(&log, &mut table).unwrap();
    assert_eq!(report.succeeded().collect::<Vec<_>>(), vec![&TransactionId::new("T1")]);
    assert_eq!(table.read("A", RowId::new(1)).unwrap(), Value::Integer(20));
    assert_eq!(table.read("B", RowId::new(2)).unwrap(), Value::Integer(7));
}

#[test]
fn empty_checkpoint_replays_only_later_transactions() {
    let log = LogBuilder::new()
        .start("T1")
        .write("T1", 1, "A", 99)
        .commit("T1")
        .checkpoint(Vec::<&str>::new())
        .start("T2")
        .write("T2", 1, "B", 11)
        .commit("T2")
        .start("T3")
        .write("T3", 2, "B", 12)
        .crash()
        .build();

    let mut table = seeded_table();
    let report = recover(&log, &mut table).unwrap();

    assert_eq!(report.analysis.start_index, 4);
    assert_eq!(report.analysis.not_durable, ids(&["T2", "T3"]));
    assert_eq!(
        report.events,
        vec![
            RedoEvent::Succeeded {
                txid: TransactionId::new("T2"),
                position: 6,
                applied: 1,
                skipped: 0,
            },
            RedoEvent::NotCompleted {
                txid: TransactionId::new("T3"),
                pending: 1,
            },
        ]
    );
    // T1 is durable by the checkpoint and is not reapplied
    assert_eq!(table.read("A", RowId::new(1)).unwrap(), Value::Integer(20));
    assert_eq!(table.read("B", RowId::new(1)).unwrap(), Value::Integer(11));
    assert_eq!(table.read("B", RowId::new(2)).unwrap(), Value::Integer(30));
}

#[test]
fn empty_checkpoint_with_nothing_after_it() {
    let log = LogBuilder::new()
        .start("T1")
        .commit("T1")
        .checkpoint(Vec::<&str>::new())
        .crash()
        .build();

    let mut table = seeded_table();
    let report = recover(&log, &mut table).unwrap();
    assert_eq!(report.analysis.start_index, 3);
    assert!(report.analysis.not_durable.is_empty());
    assert!(report.events.is_empty());
}

#[test]
fn no_checkpoint_replays_whole_log() {
    let log = LogBuilder::new()
        .start("T1")
        .write("T1", 1, "A", 1)
        .start("T2")
        .write("T2", 2, "A", 2)
        .commit("T2")
        .commit("T1")
        .build();

    let mut table = seeded_table();
    let report = recover(&log, &mut table).unwrap();
    assert_eq!(report.analysis.checkpoint, None);
    assert_eq!(report.analysis.start_index, 0);
    let order: Vec<_> = report.succeeded().map(TransactionId::as_str).collect();
    assert_eq!(order, vec!["T2", "T1"]);
    assert!(report.is_complete());
}

#[test]
fn last_write_in_transaction_wins() {
    let log = LogBuilder::new()
        .start("T1")
        .write("T1", 1, "A", 1)
        .write("T1", 1, "A", 2)
        .write("T1", 1, "A", 3)
        .commit("T1")
        .build();

    let mut table = seeded_table();
    let report = recover(&log, &mut table).unwrap();
    assert_eq!(report.writes_applied, 1);
    assert_eq!(table.read("A", RowId::new(1)).unwrap(), Value::Integer(3));
    assert_eq!(table.write_count(), 1);
}

#[test]
fn second_pass_writes_nothing() {
    let log = LogBuilder::new()
        .start("T1")
        .write("T1", 1, "A", 5)
        .write("T1", 2, "B", "NULL")
        .commit("T1")
        .start("T2")
        .write("T2", 2, "A", 6)
        .crash()
        .build();

    let mut table = seeded_table();
    let first = recover(&log, &mut table).unwrap();
    let after_first = table.snapshot();
    let second = recover(&log, &mut table).unwrap();

    assert_eq!(first.writes_applied, 2);
    assert_eq!(second.writes_applied, 0);
    assert_eq!(second.writes_skipped, 2);
    assert_eq!(table.snapshot(), after_first);
    assert_eq!(table.read("B", RowId::new(2)).unwrap(), Value::Null);
    assert_eq!(second.not_completed().collect::<Vec<_>>(), vec![&TransactionId::new("T2")]);
}

#[test]
fn missing_row_aborts_pass() {
    let log = LogBuilder::new()
        .start("T1")
        .write("T1", 9, "A", 5)
        .commit("T1")
        .build();

    let mut table = seeded_table();
    let err = recover(&log, &mut table).unwrap_err();
    assert!(matches!(err, CoreError::Replay { position: 2, .. }));
    assert!(err.is_not_found());
}

#[test]
fn file_table_recovery_survives_reopen() {
    let mut temp = TempTable::seeded();
    let log = temp.write_log(
        &LogBuilder::new()
            .start("T1")
            .write("T1", 2, "A", 42)
            .commit("T1")
            .crash()
            .build(),
    );

    let report = Recovery::default().run_file(&log, &mut *temp).unwrap();
    assert_eq!(report.writes_applied, 1);
    assert_eq!(temp.reopen().read("A", RowId::new(2)).unwrap(), Value::Integer(42));
}

#[test]
fn dry_run_on_file_table_leaves_disk_alone() {
    let mut temp = TempTable::seeded();
    let log = temp.write_log(
        &LogBuilder::new()
            .start("T1")
            .write("T1", 2, "A", 42)
            .commit("T1")
            .build(),
    );

    let recovery = Recovery::new(RecoveryConfig::new().dry_run(true));
    let report = recovery.run_file(&log, &mut *temp).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.writes_applied, 1);
    assert_eq!(temp.reopen().read("A", RowId::new(2)).unwrap(), Value::Integer(20));
    assert!(!temp.is_dirty());
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn engine_matches_model(log in generated_log_strategy(40)) {
        let mut table = generated_table();
        let initial: TableData = table.snapshot();
        let expected = expected_outcome(&log.records, &initial).unwrap();

        let report = Recovery::default().run_records(&log.records, &mut table).unwrap();

        prop_assert_eq!(&report.analysis.not_durable, &expected.not_durable);
        let succeeded: Vec<TransactionId> = report.succeeded().cloned().collect();
        prop_assert_eq!(succeeded, expected.committed);
        let not_completed: BTreeSet<TransactionId> = report.not_completed().cloned().collect();
        prop_assert_eq!(not_completed, expected.incomplete);
        prop_assert_eq!(table.snapshot(), expected.table);
    }

    #[test]
    fn recovery_is_idempotent(log in generated_log_strategy(40)) {
        let mut table = generated_table();
        Recovery::default().run_records(&log.records, &mut table).unwrap();
        let after_first = table.snapshot();
        let writes = table.write_count();

        let second = Recovery::default().run_records(&log.records, &mut table).unwrap();
        prop_assert_eq!(second.writes_applied, 0);
        prop_assert_eq!(table.write_count(), writes);
        prop_assert_eq!(table.snapshot(), after_first);
    }

    #[test]
    fn success_and_incomplete_are_disjoint(log in generated_log_strategy(40)) {
        let mut table = generated_table();
        let report = Recovery::default().run_records(&log.records, &mut table).unwrap();

        let succeeded: BTreeSet<_> = report.succeeded().collect();
        for txid in report.not_completed() {
            prop_assert!(!succeeded.contains(txid));
            prop_assert!(report.analysis.is_not_durable(txid));
        }
        for txid in &succeeded {
            prop_assert!(report.analysis.is_not_durable(txid));
        }
    }

    #[test]
    fn dry_run_reports_same_as_real_run(log in generated_log_strategy(40)) {
        let mut dry = generated_table();
        let mut real = generated_table();
        let before = dry.snapshot();

        let dry_report = Recovery::new(RecoveryConfig::new().dry_run(true))
            .run_records(&log.records, &mut dry)
            .unwrap();
        let real_report = Recovery::default().run_records(&log.records, &mut real).unwrap();

        prop_assert_eq!(dry.snapshot(), before);
        prop_assert_eq!(dry.write_count(), 0);
        prop_assert_eq!(dry_report.events, real_report.events);
        prop_assert_eq!(dry_report.writes_applied, real_report.writes_applied);
    }

    #[test]
    fn replay_window_is_within_crash(log in generated_log_strategy(40)) {
        let records = parse_log(&log.text()).unwrap();
        let analysis = analyze(&records);
        prop_assert!(analysis.start_index <= analysis.end_index);
        prop_assert!(analysis.end_index <= records.len());
        if let Some(checkpoint) = analysis.checkpoint {
            prop_assert!(checkpoint < analysis.end_index);
        }
    }
}
