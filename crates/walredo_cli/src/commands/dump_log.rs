//! Dump log command implementation.

use super::OutputFormat;
use serde::Serialize;
use std::path::Path;
use walredo_core::{parse_log, LogRecord};

/// Log record representation for output.
#[derive(Debug, Serialize)]
pub struct LogRecordInfo<'a> {
    /// Position in the parsed log.
    pub position: usize,
    /// The record.
    #[serde(flatten)]
    pub record: &'a LogRecord,
}

/// Runs the dump-log command.
pub fn run(
    log: &Path,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(log)?;
    let records = parse_log(&text)?;
    let infos: Vec<LogRecordInfo<'_>> = records
        .iter()
        .enumerate()
        .take(limit.unwrap_or(usize::MAX))
        .map(|(position, record)| LogRecordInfo { position, record })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&infos)?),
        OutputFormat::Text => print_text_output(&infos, records.len()),
    }

    Ok(())
}

fn print_text_output(infos: &[LogRecordInfo<'_>], total: usize) {
    println!("{:>6}  {:<10}  {:<6}  DETAILS", "POS", "TYPE", "TXN");
    for info in infos {
        let txid = info
            .record
            .txid()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        let details = match info.record {
            LogRecord::Write {
                row, column, value, ..
            } => format!("{column}[{}] = {value}", row.as_u64()),
            LogRecord::Checkpoint { active } => format!(
                "active: {}",
                super::join(active.iter())
            ),
            _ => String::new(),
        };
        println!(
            "{:>6}  {:<10}  {:<6}  {}",
            info.position,
            info.record.record_type(),
            txid,
            details
        );
    }
    if infos.len() < total {
        println!("... {} more records", total - infos.len());
    }
}
