//! Analyze command implementation.

use super::{print_analysis, OutputFormat};
use std::path::Path;
use walredo_core::Recovery;

/// Runs the analyze command.
pub fn run(log: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(log)?;
    let (records, analysis) = Recovery::default().analyze(&text)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => {
            println!("Analysis of {:?} ({} records)", log, records.len());
            println!();
            print_analysis(&analysis);
        }
    }

    Ok(())
}
