//! Spreadsheet parser: raw file bytes -> canonical records + row errors
//!
//! The parser knows nothing about persistence. It resolves the header row
//! once against the schema aliases, then converts each data row
//! independently: a malformed row becomes a row error, never an abort.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xls, Xlsx};
use chrono::NaiveDate;

use super::models::{CanonicalRecord, ImportError, LicenseStatus, RowError};
use super::normalize::{normalize_license_number, parse_date};
use super::schema::{ResolvedColumns, SchemaConfig, resolve_columns};

/// Everything produced by one parse. Rows are materialized - files are
/// bounded to thousands of rows and restart-from-source is a re-parse.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub records: Vec<CanonicalRecord>,
    pub errors: Vec<RowError>,
    /// Non-empty data rows seen (valid or not)
    pub rows_processed: usize,
}

/// Parse a tabular file from raw bytes. The format is chosen by the file
/// name's extension: `.csv` via the csv reader, `.xls` via the legacy
/// reader, anything else is treated as xlsx.
pub fn parse_bytes(
    bytes: &[u8],
    file_name: &str,
    schema: &SchemaConfig,
) -> Result<ParsedImport, ImportError> {
    let extension = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" => csv_rows(bytes)?,
        "xls" => {
            let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))
                .map_err(|e| ImportError::Unreadable(e.to_string()))?;
            workbook_rows(&mut workbook)?
        }
        _ => {
            let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| ImportError::Unreadable(e.to_string()))?;
            workbook_rows(&mut workbook)?
        }
    };

    build_records(rows, schema)
}

/// Convenience wrapper for on-disk files
pub fn parse_file(path: &Path, schema: &SchemaConfig) -> Result<ParsedImport, ImportError> {
    let bytes =
        std::fs::read(path).map_err(|e| ImportError::Unreadable(format!("{}: {}", path.display(), e)))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    parse_bytes(&bytes, &file_name, schema)
}

/// Rows of the first sheet of a calamine workbook
fn workbook_rows<RS, R>(workbook: &mut R) -> Result<Vec<Vec<Data>>, ImportError>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::Unreadable("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::Unreadable(format!("failed to read sheet {}: {}", sheet_name, e)))?;

    Ok(range.rows().map(|r| r.to_vec()).collect())
}

/// CSV rows lifted into the same cell representation as workbook rows
fn csv_rows(bytes: &[u8]) -> Result<Vec<Vec<Data>>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ImportError::Unreadable(e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|cell| Data::String(cell.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

fn build_records(rows: Vec<Vec<Data>>, schema: &SchemaConfig) -> Result<ParsedImport, ImportError> {
    if rows.is_empty() {
        return Err(ImportError::Unreadable("file has no header row".to_string()));
    }

    let headers: Vec<String> = rows[0].iter().map(cell_to_string).collect();
    let cols = resolve_columns(&headers, schema)?;

    let mut parsed = ParsedImport::default();

    for (row_idx, row) in rows.iter().enumerate().skip(1) {
        let row_num = row_idx + 1; // 1-based, matching what users see in the file

        // Skip entirely empty rows
        if row.iter().all(|c| cell_to_string(c).trim().is_empty()) {
            continue;
        }

        parsed.rows_processed += 1;

        match build_record(row, row_num, &cols, schema) {
            Ok(record) => parsed.records.push(record),
            Err(reason) => {
                log::debug!("Row {}: {}", row_num, reason);
                parsed.errors.push(RowError {
                    row: row_num,
                    reason,
                });
            }
        }
    }

    log::info!(
        "Parsed {} rows: {} records, {} errors",
        parsed.rows_processed,
        parsed.records.len(),
        parsed.errors.len()
    );

    Ok(parsed)
}

fn build_record(
    row: &[Data],
    row_num: usize,
    cols: &ResolvedColumns,
    schema: &SchemaConfig,
) -> Result<CanonicalRecord, String> {
    let raw_license = get_cell_string(row, cols.license_number);
    let license_number = normalize_license_number(&raw_license, &schema.license_normalization);
    if license_number.is_empty() {
        return Err("missing license number".to_string());
    }

    let mut record = CanonicalRecord::new(row_num, license_number);

    if let Some(col) = cols.full_name {
        record.full_name = get_cell_string(row, col).trim().to_string();
    }
    if let Some(col) = cols.license_type {
        record.license_type = optional_string(row, col);
    }
    if let Some(col) = cols.address {
        record.address = optional_string(row, col);
    }
    if let Some(col) = cols.issue_date {
        record.issue_date = cell_to_date(row.get(col))
            .map_err(|e| format!("issue date: {}", e))?;
    }
    if let Some(col) = cols.expiration_date {
        record.expiration_date = cell_to_date(row.get(col))
            .map_err(|e| format!("expiration date: {}", e))?;
    }
    if let Some(col) = cols.status {
        record.status = LicenseStatus::parse(&get_cell_string(row, col));
    }

    Ok(record)
}

fn optional_string(row: &[Data], col: usize) -> Option<String> {
    let s = get_cell_string(row, col).trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        _ => String::new(),
    }
}

fn get_cell_string(row: &[Data], col: usize) -> String {
    row.get(col).map(cell_to_string).unwrap_or_default()
}

/// Interpret a date cell. Native spreadsheet datetimes come through as
/// `Data::DateTime`; csv and string-typed columns fall back to the textual
/// formats in `normalize::parse_date`. An empty cell is simply no date.
fn cell_to_date(cell: Option<&Data>) -> Result<Option<NaiveDate>, String> {
    let cell = match cell {
        Some(c) => c,
        None => return Ok(None),
    };

    match cell {
        Data::Empty => Ok(None),
        Data::String(s) if s.trim().is_empty() => Ok(None),
        Data::String(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| format!("unrecognized date '{}'", s.trim())),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Some(d.date()))
            .ok_or_else(|| "invalid spreadsheet date value".to_string()),
        Data::DateTimeIso(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| format!("unrecognized date '{}'", s)),
        other => Err(format!("unrecognized date '{}'", other)),
    }
}
