//! CLI command implementations.

pub mod analyze;
pub mod dump_log;
pub mod redo;

use std::str::FromStr;
use thiserror::Error;
use walredo_core::CheckpointAnalysis;

/// How command output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Unknown `--format` value.
#[derive(Debug, Error)]
#[error("unknown output format `{0}` (expected text or json)")]
pub struct UnknownFormat(String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Prints the checkpoint analysis block shared by `redo` and `analyze`.
pub(crate) fn print_analysis(analysis: &CheckpointAnalysis) {
    match analysis.checkpoint {
        Some(position) => println!("  Checkpoint:   record {position}"),
        None => println!("  Checkpoint:   none (replaying whole log)"),
    }
    println!(
        "  Replay range: records {}..{}",
        analysis.start_index, analysis.end_index
    );
    println!("  Not durable:  {}", join(analysis.not_durable.iter()));
    if !analysis.unresolved.is_empty() {
        println!(
            "  Unresolved:   {} (checkpointed without a start record)",
            join(analysis.unresolved.iter())
        );
    }
}

pub(crate) fn join<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    let parts: Vec<String> = items.map(|i| i.to_string()).collect();
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}
