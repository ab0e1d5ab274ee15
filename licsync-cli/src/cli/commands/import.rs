//! Import command handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::*;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::import::{self, ImportOptions, ImportSummary};

pub async fn handle_import(
    pool: &SqlitePool,
    config: &Config,
    file: PathBuf,
    label: Option<String>,
    dry_run: bool,
    json: bool,
    batch_size: Option<usize>,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Import file does not exist: {}", file.display());
    }

    let label = label.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string())
    });

    let parsed = import::parse_file(&file, &config.schema)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let options = ImportOptions {
        label,
        batch_size: batch_size.unwrap_or(config.batch_size),
        dry_run,
    };

    let summary = import::reconcile(pool, parsed, &options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, dry_run);
    }

    Ok(())
}

fn print_summary(summary: &ImportSummary, dry_run: bool) {
    if dry_run {
        println!("{}", "Dry run - no changes were written".yellow().bold());
    }

    println!(
        "Processed {} rows in {:.2}s",
        summary.rows_processed.to_string().bold(),
        summary.duration.as_secs_f64()
    );
    println!("  {} {}", "created:".green(), summary.created);
    println!("  {} {}", "updated:".cyan(), summary.updated);
    println!("  {} {}", "unchanged:".dimmed(), summary.unchanged);

    if summary.error_count > 0 {
        println!("  {} {}", "errors:".red().bold(), summary.error_count);
        for error in &summary.errors {
            println!("    {} {}", format!("row {}:", error.row).red(), error.reason);
        }
    }
}
