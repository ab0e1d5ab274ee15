//! List command handler

use anyhow::Result;
use colored::*;
use sqlx::SqlitePool;

use crate::import::LicenseStatus;
use crate::storage::{Licensee, licensees};

pub async fn handle_list(
    pool: &SqlitePool,
    status: Option<String>,
    limit: i64,
    offset: i64,
    json: bool,
) -> Result<()> {
    let status = status.as_deref().map(LicenseStatus::parse);
    let results = licensees::list(pool, status, limit, offset).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No licensees found");
        return Ok(());
    }

    for licensee in &results {
        println!("{}", format_line(licensee));
    }
    println!("{}", format!("({} shown)", results.len()).dimmed());

    Ok(())
}

fn format_line(licensee: &Licensee) -> String {
    let status = match licensee.status {
        LicenseStatus::Active => licensee.status.as_str().green(),
        LicenseStatus::Expired => licensee.status.as_str().red(),
        _ => licensee.status.as_str().dimmed(),
    };
    let expiration = licensee
        .expiration_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<10} {:<40} {:<10} exp {}",
        licensee.license_number.bold(),
        licensee.full_name,
        status,
        expiration
    )
}
