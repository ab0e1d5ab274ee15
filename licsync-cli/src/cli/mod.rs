//! Command-line interface definitions

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "licsync", about = "Sync OPLC licensee exports into a local store", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import an OPLC export file (xlsx, xls or csv)
    Import {
        /// Path to the export file
        file: PathBuf,
        /// Provenance label stamped on touched rows (defaults to the file name)
        #[arg(long)]
        label: Option<String>,
        /// Classify and report without writing to the store
        #[arg(long)]
        dry_run: bool,
        /// Print the summary as JSON instead of the human-readable report
        #[arg(long)]
        json: bool,
        /// Records per transaction
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// List stored licensees
    List {
        /// Filter by status (active, inactive, expired, unknown)
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one licensee by license number
    Show {
        /// License number (normalized the same way imports are)
        license_number: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show store-wide counts
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}
