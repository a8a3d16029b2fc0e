//! Redo command implementation.

use super::{print_analysis, OutputFormat};
use serde::Serialize;
use std::path::Path;
use walredo_core::{Recovery, RecoveryConfig, RecoveryReport, RedoEvent};
use walredo_storage::{FileTable, InitialData, TableData, TableStore};

/// JSON output of the redo command.
#[derive(Debug, Serialize)]
pub struct RedoOutput<'a> {
    /// Recovery report.
    pub report: &'a RecoveryReport,
    /// Table contents after the pass.
    pub table: &'a TableData,
}

/// Runs the redo command.
pub fn run(
    log: &Path,
    table_path: &Path,
    initial: Option<&Path>,
    dry_run: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut table = FileTable::open_with_create_dirs(table_path)?;

    if let Some(initial) = initial {
        let data = InitialData::from_path(initial)?;
        table.seed(&data)?;
        tracing::info!(
            path = %initial.display(),
            rows = table.row_count(),
            "table recreated from initial data"
        );
    }

    let recovery = Recovery::new(RecoveryConfig::new().dry_run(dry_run));
    let report = recovery.run_file(log, &mut table)?;
    let snapshot = table.snapshot();

    match format {
        OutputFormat::Json => {
            let output = RedoOutput {
                report: &report,
                table: &snapshot,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print_text_output(log, &report, &snapshot),
    }

    Ok(())
}

fn print_text_output(log: &Path, report: &RecoveryReport, table: &TableData) {
    println!("Redo of {:?}{}", log, if report.dry_run { " (dry run)" } else { "" });
    println!();
    print_analysis(&report.analysis);
    println!();

    for event in &report.events {
        match event {
            RedoEvent::Succeeded {
                txid,
                applied,
                skipped,
                ..
            } => println!("  {txid}: redo succeeded ({applied} applied, {skipped} already durable)"),
            RedoEvent::NotCompleted { txid, pending } => {
                println!("  {txid}: redo not completed ({pending} buffered writes discarded)");
            }
        }
    }
    if report.events.is_empty() {
        println!("  nothing to redo");
    }

    println!();
    print_table(table);
}

fn print_table(table: &TableData) {
    let columns = table.columns();
    let header: Vec<String> = std::iter::once("ID".to_string())
        .chain(columns.iter().cloned())
        .collect();
    println!("  {}", header.join("\t"));

    for (id, cells) in table.rows() {
        let values: Vec<String> = std::iter::once(id.as_u64().to_string())
            .chain(
                columns
                    .iter()
                    .map(|c| cells.get(c).map(ToString::to_string).unwrap_or_default()),
            )
            .collect();
        println!("  {}", values.join("\t"));
    }
}
