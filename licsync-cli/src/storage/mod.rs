//! SQLite persistence for the licensee store

pub mod licensees;

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use licensees::{FieldChange, Licensee};

/// Embedded migrations, also used by tests against in-memory databases
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// A storage-level failure, split by blast radius: constraint violations
/// condemn one record, everything else (locked file, disk, closed pool)
/// condemns the whole run.
#[derive(Debug)]
pub enum StorageFault {
    /// The database rejected this record (unique/check violation)
    Constraint(String),
    /// The database itself is in trouble; no further writes should be tried
    Unavailable(String),
}

impl std::fmt::Display for StorageFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageFault::Constraint(msg) => write!(f, "constraint violation: {}", msg),
            StorageFault::Unavailable(msg) => write!(f, "storage unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StorageFault {}

impl From<sqlx::Error> for StorageFault {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    || db.is_check_violation()
                    || db.is_foreign_key_violation() =>
            {
                StorageFault::Constraint(db.message().to_string())
            }
            _ => StorageFault::Unavailable(e.to_string()),
        }
    }
}

/// Open (creating if needed) the licensee database and run pending migrations
pub async fn init_pool(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    log::debug!("Database ready at {}", path.display());
    Ok(pool)
}
