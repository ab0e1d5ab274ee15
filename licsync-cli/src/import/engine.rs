//! Reconciliation engine: canonical records -> licensee store
//!
//! Each record is classified against the store by license number and
//! becomes a create, an update of exactly the changed fields, or a no-op.
//! The engine never deletes. Work is committed in chunks so one bad record
//! condemns only itself and a systemic storage fault loses at most the
//! current chunk.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use super::models::{CanonicalRecord, ImportSummary, RecordOutcome};
use super::parser::ParsedImport;
use crate::storage::{FieldChange, Licensee, StorageFault, licensees};

pub struct ImportOptions {
    /// Provenance label stamped on every touched row (typically the file name)
    pub label: String,
    /// Records per transaction
    pub batch_size: usize,
    /// Classify and report without writing
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            label: String::new(),
            batch_size: 500,
            dry_run: false,
        }
    }
}

/// Reconcile a parsed import against the store and return the summary.
///
/// Row-level problems (parse errors, in-batch duplicates, constraint
/// rejections) are recorded in the summary and never abort the run; a
/// storage fault that is not record-specific rolls back the current chunk
/// and returns an error. Chunks committed before the fault stay committed -
/// re-running the same file converges because reconciliation is idempotent.
pub async fn reconcile(
    pool: &SqlitePool,
    parsed: ParsedImport,
    opts: &ImportOptions,
) -> Result<ImportSummary> {
    let started = Instant::now();
    let now = Utc::now();

    let mut summary = ImportSummary {
        rows_processed: parsed.rows_processed,
        ..Default::default()
    };
    for error in parsed.errors {
        summary.record_error(error.row, error.reason);
    }

    let records = dedupe_last_wins(parsed.records, &mut summary);

    if opts.dry_run {
        let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
        for record in &records {
            match classify(&mut *conn, record).await {
                Ok((outcome, _)) => summary.record_outcome(outcome),
                Err(StorageFault::Constraint(msg)) => summary.record_error(record.source_row, msg),
                Err(fault @ StorageFault::Unavailable(_)) => {
                    return Err(fault).context("Storage failed during dry run");
                }
            }
        }
    } else {
        for chunk in records.chunks(opts.batch_size.max(1)) {
            apply_chunk(pool, chunk, now, opts, &mut summary).await?;
        }
    }

    summary.errors.sort_by_key(|e| e.row);
    summary.duration = started.elapsed();

    log::info!(
        "Import '{}': {} rows, {} created, {} updated, {} unchanged, {} errors in {:.2}s",
        opts.label,
        summary.rows_processed,
        summary.created,
        summary.updated,
        summary.unchanged,
        summary.error_count,
        summary.duration.as_secs_f64()
    );

    Ok(summary)
}

/// Collapse in-batch duplicates so each license number is applied once,
/// with the last occurrence's content. Superseded rows are reported as row
/// errors so the file owner can clean the export.
fn dedupe_last_wins(
    records: Vec<CanonicalRecord>,
    summary: &mut ImportSummary,
) -> Vec<CanonicalRecord> {
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut deduped: Vec<CanonicalRecord> = Vec::with_capacity(records.len());

    for record in records {
        match by_key.get(&record.license_number) {
            Some(&idx) => {
                let superseded = &deduped[idx];
                log::debug!(
                    "Row {} superseded by row {} (duplicate license number {})",
                    superseded.source_row,
                    record.source_row,
                    record.license_number
                );
                summary.record_error(
                    superseded.source_row,
                    format!(
                        "duplicate license number {} superseded by row {}",
                        record.license_number, record.source_row
                    ),
                );
                deduped[idx] = record;
            }
            None => {
                by_key.insert(record.license_number.clone(), deduped.len());
                deduped.push(record);
            }
        }
    }

    deduped
}

/// Apply one chunk inside its own transaction. A constraint fault skips
/// that record; an availability fault rolls the chunk back and aborts.
async fn apply_chunk(
    pool: &SqlitePool,
    chunk: &[CanonicalRecord],
    now: chrono::DateTime<Utc>,
    opts: &ImportOptions,
    summary: &mut ImportSummary,
) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to start transaction")?;

    for record in chunk {
        match apply_record(&mut *tx, record, now, &opts.label).await {
            Ok(outcome) => summary.record_outcome(outcome),
            Err(StorageFault::Constraint(msg)) => {
                log::warn!("Row {}: rejected by storage: {}", record.source_row, msg);
                summary.record_error(record.source_row, msg);
            }
            Err(fault @ StorageFault::Unavailable(_)) => {
                log::error!(
                    "Storage fault at row {}; rolling back chunk ({} created, {} updated so far committed)",
                    record.source_row,
                    summary.created,
                    summary.updated
                );
                return Err(fault).context("Storage failed mid-import");
            }
        }
    }

    tx.commit().await.context("Failed to commit chunk")?;
    Ok(())
}

async fn apply_record(
    conn: &mut SqliteConnection,
    record: &CanonicalRecord,
    now: chrono::DateTime<Utc>,
    label: &str,
) -> Result<RecordOutcome, StorageFault> {
    let (outcome, target) = classify(&mut *conn, record).await?;

    match (outcome, target) {
        (RecordOutcome::Created, _) => {
            licensees::create(conn, record, now, label).await?;
            log::debug!("Row {}: created {}", record.source_row, record.license_number);
        }
        (RecordOutcome::Updated, Some((existing, changes))) => {
            for change in &changes {
                log::debug!(
                    "Row {}: {} changes {}",
                    record.source_row,
                    record.license_number,
                    change.column()
                );
            }
            licensees::update_fields(conn, existing.id, &changes, now, label).await?;
        }
        (RecordOutcome::Unchanged, Some((existing, _))) => {
            licensees::touch(conn, existing.id, now, label).await?;
        }
        // classify never returns Updated/Unchanged without the stored row
        _ => unreachable!("outcome without stored licensee"),
    }

    Ok(outcome)
}

/// Decide what this record means for the store, without writing anything.
/// For Updated/Unchanged the stored row and the computed changes ride along
/// so the write path does not re-query.
async fn classify(
    conn: &mut SqliteConnection,
    record: &CanonicalRecord,
) -> Result<(RecordOutcome, Option<(Licensee, Vec<FieldChange>)>), StorageFault> {
    match licensees::find_by_license_number(conn, &record.license_number).await? {
        None => Ok((RecordOutcome::Created, None)),
        Some(existing) => {
            let changes = diff_fields(&existing, record);
            if changes.is_empty() {
                Ok((RecordOutcome::Unchanged, Some((existing, changes))))
            } else {
                Ok((RecordOutcome::Updated, Some((existing, changes))))
            }
        }
    }
}

/// Field-by-field comparison, snapshot semantics: the incoming file is the
/// authority, so a present-vs-absent difference in either direction counts
/// as a change.
fn diff_fields(existing: &Licensee, incoming: &CanonicalRecord) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if existing.full_name != incoming.full_name {
        changes.push(FieldChange::FullName(incoming.full_name.clone()));
    }
    if existing.license_type != incoming.license_type {
        changes.push(FieldChange::LicenseType(incoming.license_type.clone()));
    }
    if existing.issue_date != incoming.issue_date {
        changes.push(FieldChange::IssueDate(incoming.issue_date));
    }
    if existing.expiration_date != incoming.expiration_date {
        changes.push(FieldChange::ExpirationDate(incoming.expiration_date));
    }
    if existing.address != incoming.address {
        changes.push(FieldChange::Address(incoming.address.clone()));
    }
    if existing.status != incoming.status {
        changes.push(FieldChange::Status(incoming.status));
    }

    changes
}
