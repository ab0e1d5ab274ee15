//! Stats command handler

use anyhow::Result;
use colored::*;
use serde_json::json;
use sqlx::SqlitePool;

use crate::storage::licensees;

pub async fn handle_stats(pool: &SqlitePool, json_output: bool) -> Result<()> {
    let total = licensees::count_total(pool).await?;
    let by_status = licensees::count_by_status(pool).await?;

    if json_output {
        let statuses: serde_json::Map<String, serde_json::Value> = by_status
            .into_iter()
            .map(|(status, count)| (status, json!(count)))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "total": total,
                "by_status": statuses,
            }))?
        );
        return Ok(());
    }

    println!("{} {}", "Total licensees:".bold(), total);
    for (status, count) in by_status {
        println!("  {:<10} {}", status.dimmed(), count);
    }

    Ok(())
}
