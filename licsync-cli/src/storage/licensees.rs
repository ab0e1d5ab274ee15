//! Repository for licensee rows
//!
//! Write operations take `&mut SqliteConnection` so the reconciliation
//! engine can scope them to its own transactions; read operations used by
//! the CLI query surface take the pool directly.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::StorageFault;
use crate::import::{CanonicalRecord, LicenseStatus};

/// One stored licensee. `license_number` is the unique business key; `id`
/// is internal and stable across imports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Licensee {
    pub id: i64,
    pub license_number: String,
    pub full_name: String,
    pub license_type: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub status: LicenseStatus,
    pub created_at: DateTime<Utc>,
    pub last_sync_at: DateTime<Utc>,
    pub first_seen_import: String,
    pub last_seen_import: String,
}

/// A single field whose incoming value differs from the stored one.
/// Updates write exactly these columns plus the sync metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    FullName(String),
    LicenseType(Option<String>),
    IssueDate(Option<NaiveDate>),
    ExpirationDate(Option<NaiveDate>),
    Address(Option<String>),
    Status(LicenseStatus),
}

impl FieldChange {
    pub fn column(&self) -> &'static str {
        match self {
            FieldChange::FullName(_) => "full_name",
            FieldChange::LicenseType(_) => "license_type",
            FieldChange::IssueDate(_) => "issue_date",
            FieldChange::ExpirationDate(_) => "expiration_date",
            FieldChange::Address(_) => "address",
            FieldChange::Status(_) => "status",
        }
    }
}

fn row_to_licensee(row: &SqliteRow) -> Result<Licensee, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Licensee {
        id: row.try_get("id")?,
        license_number: row.try_get("license_number")?,
        full_name: row.try_get("full_name")?,
        license_type: row.try_get("license_type")?,
        issue_date: row.try_get("issue_date")?,
        expiration_date: row.try_get("expiration_date")?,
        address: row.try_get("address")?,
        status: LicenseStatus::parse(&status),
        created_at: row.try_get("created_at")?,
        last_sync_at: row.try_get("last_sync_at")?,
        first_seen_import: row.try_get("first_seen_import")?,
        last_seen_import: row.try_get("last_seen_import")?,
    })
}

const ALL_COLUMNS: &str = "id, license_number, full_name, license_type, issue_date, \
     expiration_date, address, status, created_at, last_sync_at, \
     first_seen_import, last_seen_import";

/// Look up a licensee by its normalized license number
pub async fn find_by_license_number(
    conn: &mut SqliteConnection,
    license_number: &str,
) -> Result<Option<Licensee>, StorageFault> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM licensees WHERE license_number = ?",
        ALL_COLUMNS
    ))
    .bind(license_number)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_licensee(&row)?)),
        None => Ok(None),
    }
}

/// Insert a new licensee from a canonical record. Returns the new row id.
pub async fn create(
    conn: &mut SqliteConnection,
    record: &CanonicalRecord,
    now: DateTime<Utc>,
    import_label: &str,
) -> Result<i64, StorageFault> {
    let result = sqlx::query(
        r#"
        INSERT INTO licensees (
            license_number, full_name, license_type, issue_date, expiration_date,
            address, status, created_at, last_sync_at, first_seen_import, last_seen_import
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.license_number)
    .bind(&record.full_name)
    .bind(&record.license_type)
    .bind(record.issue_date)
    .bind(record.expiration_date)
    .bind(&record.address)
    .bind(record.status.as_str())
    .bind(now)
    .bind(now)
    .bind(import_label)
    .bind(import_label)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Update exactly the given fields on one licensee, plus sync metadata.
/// The statement is built from the change list so untouched columns are
/// never rewritten.
pub async fn update_fields(
    conn: &mut SqliteConnection,
    id: i64,
    changes: &[FieldChange],
    now: DateTime<Utc>,
    import_label: &str,
) -> Result<(), StorageFault> {
    let mut set_clauses: Vec<String> =
        changes.iter().map(|c| format!("{} = ?", c.column())).collect();
    set_clauses.push("last_sync_at = ?".to_string());
    set_clauses.push("last_seen_import = ?".to_string());

    let sql = format!(
        "UPDATE licensees SET {} WHERE id = ?",
        set_clauses.join(", ")
    );

    let mut query = sqlx::query(&sql);
    for change in changes {
        query = match change {
            FieldChange::FullName(v) => query.bind(v.clone()),
            FieldChange::LicenseType(v) => query.bind(v.clone()),
            FieldChange::IssueDate(v) => query.bind(*v),
            FieldChange::ExpirationDate(v) => query.bind(*v),
            FieldChange::Address(v) => query.bind(v.clone()),
            FieldChange::Status(v) => query.bind(v.as_str()),
        };
    }

    query
        .bind(now)
        .bind(import_label)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Mark an unchanged licensee as seen by this import without touching any
/// business field.
pub async fn touch(
    conn: &mut SqliteConnection,
    id: i64,
    now: DateTime<Utc>,
    import_label: &str,
) -> Result<(), StorageFault> {
    sqlx::query("UPDATE licensees SET last_sync_at = ?, last_seen_import = ? WHERE id = ?")
        .bind(now)
        .bind(import_label)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// List licensees, optionally filtered by status, ordered by license number
pub async fn list(
    pool: &SqlitePool,
    status: Option<LicenseStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Licensee>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(&format!(
                "SELECT {} FROM licensees WHERE status = ? \
                 ORDER BY license_number LIMIT ? OFFSET ?",
                ALL_COLUMNS
            ))
            .bind(status.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM licensees ORDER BY license_number LIMIT ? OFFSET ?",
                ALL_COLUMNS
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list licensees")?;

    let mut licensees = Vec::new();
    for row in rows {
        licensees.push(row_to_licensee(&row).context("Failed to read licensee row")?);
    }
    Ok(licensees)
}

/// Get one licensee by license number (CLI query surface)
pub async fn get(pool: &SqlitePool, license_number: &str) -> Result<Option<Licensee>> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    find_by_license_number(&mut conn, license_number)
        .await
        .context("Failed to look up licensee")
}

/// Total licensee count
pub async fn count_total(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM licensees")
        .fetch_one(pool)
        .await
        .context("Failed to count licensees")?;
    Ok(row.0)
}

/// Counts grouped by status, descending
pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query(
        "SELECT status, COUNT(*) as n FROM licensees GROUP BY status ORDER BY n DESC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to count licensees by status")?;

    let mut counts = Vec::new();
    for row in rows {
        counts.push((row.try_get("status")?, row.try_get("n")?));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::storage::MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_constraint_fault() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let record = CanonicalRecord::new(2, "7308");

        create(&mut *conn, &record, Utc::now(), "a.xlsx").await.unwrap();
        let err = create(&mut *conn, &record, Utc::now(), "a.xlsx")
            .await
            .unwrap_err();

        assert!(matches!(err, StorageFault::Constraint(_)));
    }

    #[tokio::test]
    async fn test_update_touches_only_named_columns() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let mut record = CanonicalRecord::new(2, "7308");
        record.full_name = "Jane Doe".to_string();
        record.address = Some("1 Main St".to_string());
        let now = Utc::now();
        let id = create(&mut *conn, &record, now, "a.xlsx").await.unwrap();

        update_fields(
            &mut *conn,
            id,
            &[FieldChange::FullName("Jane Doe-Williams".to_string())],
            now,
            "b.xlsx",
        )
        .await
        .unwrap();

        let stored = find_by_license_number(&mut *conn, "7308")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.full_name, "Jane Doe-Williams");
        assert_eq!(stored.address, Some("1 Main St".to_string()));
        assert_eq!(stored.first_seen_import, "a.xlsx");
        assert_eq!(stored.last_seen_import, "b.xlsx");
    }
}
