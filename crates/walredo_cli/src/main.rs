//! walredo CLI
//!
//! Command-line front end for the REDO recovery pass.
//!
//! # Commands
//!
//! - `redo` - Seed a table (optionally) and replay a log into it
//! - `analyze` - Show the checkpoint analysis of a log
//! - `dump-log` - Dump parsed log records for debugging

mod commands;

use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// walredo command-line recovery tools.
#[derive(Parser)]
#[command(name = "walredo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the not-durable part of a log into a table
    Redo {
        /// Path to the log file
        #[arg(short, long)]
        log: PathBuf,

        /// Path to the table file (JSON)
        #[arg(short, long)]
        table: PathBuf,

        /// Recreate the table from this initial-data file first
        #[arg(short, long)]
        initial: Option<PathBuf>,

        /// Dry run - report what would be written
        #[arg(short, long)]
        dry_run: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show which transactions a redo pass would replay
    Analyze {
        /// Path to the log file
        #[arg(short, long)]
        log: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Dump parsed log records for debugging
    DumpLog {
        /// Path to the log file
        #[arg(short, long)]
        log: PathBuf,

        /// Maximum number of records to dump
        #[arg(long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Redo {
            log,
            table,
            initial,
            dry_run,
            format,
        } => {
            let format: OutputFormat = format.parse()?;
            commands::redo::run(&log, &table, initial.as_deref(), dry_run, format)?;
        }
        Commands::Analyze { log, format } => {
            commands::analyze::run(&log, format.parse::<OutputFormat>()?)?;
        }
        Commands::DumpLog { log, limit, format } => {
            commands::dump_log::run(&log, limit, format.parse::<OutputFormat>()?)?;
        }
        Commands::Version => {
            println!("walredo CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("walredo core v{}", walredo_core::VERSION);
        }
    }

    Ok(())
}
