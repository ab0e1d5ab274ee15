//! Show command handler

use anyhow::Result;
use colored::*;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::import::normalize_license_number;
use crate::storage::licensees;

pub async fn handle_show(
    pool: &SqlitePool,
    config: &Config,
    license_number: String,
    json: bool,
) -> Result<()> {
    // Normalize the argument the same way imports do, so `show 07308`
    // finds the row stored as 7308
    let key = normalize_license_number(&license_number, &config.schema.license_normalization);

    let licensee = match licensees::get(pool, &key).await? {
        Some(licensee) => licensee,
        None => {
            anyhow::bail!("No licensee with license number {}", key);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&licensee)?);
        return Ok(());
    }

    println!("{} {}", "License:".bold(), licensee.license_number);
    println!("{} {}", "Name:".bold(), licensee.full_name);
    if let Some(license_type) = &licensee.license_type {
        println!("{} {}", "Type:".bold(), license_type);
    }
    println!("{} {}", "Status:".bold(), licensee.status);
    if let Some(date) = licensee.issue_date {
        println!("{} {}", "Issued:".bold(), date);
    }
    if let Some(date) = licensee.expiration_date {
        println!("{} {}", "Expires:".bold(), date);
    }
    if let Some(address) = &licensee.address {
        println!("{} {}", "Address:".bold(), address);
    }
    println!(
        "{} {} (first seen in {})",
        "Synced:".dimmed(),
        licensee.last_sync_at.format("%Y-%m-%d %H:%M UTC"),
        licensee.first_seen_import
    );

    Ok(())
}
