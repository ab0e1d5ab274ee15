//! Core types for spreadsheet imports

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// License status as reported by the OPLC export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Inactive,
    Expired,
    Unknown,
}

impl LicenseStatus {
    /// Parse a status cell. Unrecognized values map to Unknown rather than
    /// failing the row - status wording drifts between monthly files.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "active" => LicenseStatus::Active,
            "inactive" => LicenseStatus::Inactive,
            "expired" | "lapsed" => LicenseStatus::Expired,
            _ => LicenseStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Active => "active",
            LicenseStatus::Inactive => "inactive",
            LicenseStatus::Expired => "expired",
            LicenseStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for LicenseStatus {
    fn default() -> Self {
        LicenseStatus::Unknown
    }
}

/// The normalized representation of one spreadsheet row, independent of the
/// source file's exact column layout.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    /// 1-based spreadsheet row number (for error reporting)
    pub source_row: usize,
    /// Normalized unique business key
    pub license_number: String,
    pub full_name: String,
    pub license_type: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub status: LicenseStatus,
}

impl CanonicalRecord {
    pub fn new(source_row: usize, license_number: impl Into<String>) -> Self {
        Self {
            source_row,
            license_number: license_number.into(),
            full_name: String::new(),
            license_type: None,
            issue_date: None,
            expiration_date: None,
            address: None,
            status: LicenseStatus::Unknown,
        }
    }
}

/// A row-level problem: malformed data, duplicate key, or a per-record
/// storage fault. Recorded in the summary, never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub reason: String,
}

/// Fatal import errors - nothing row-level can be salvaged
#[derive(Debug)]
pub enum ImportError {
    /// A required column could not be resolved from the header row
    Schema { missing: Vec<String> },
    /// The file itself could not be read as a workbook
    Unreadable(String),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Schema { missing } => {
                write!(f, "required column(s) not found: {}", missing.join(", "))
            }
            ImportError::Unreadable(msg) => write!(f, "unreadable file: {}", msg),
        }
    }
}

impl std::error::Error for ImportError {}

/// Per-record classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Summary of one import run, returned to the caller. Counts accumulate
/// monotonically in file order; errors keep their row order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub rows_processed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub error_count: usize,
    pub errors: Vec<RowError>,
    #[serde(serialize_with = "duration_secs")]
    pub duration: Duration,
}

impl ImportSummary {
    pub fn record_error(&mut self, row: usize, reason: impl Into<String>) {
        self.errors.push(RowError {
            row,
            reason: reason.into(),
        });
        self.error_count += 1;
    }

    pub fn record_outcome(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

fn duration_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_known_values() {
        assert_eq!(LicenseStatus::parse("Active"), LicenseStatus::Active);
        assert_eq!(LicenseStatus::parse(" INACTIVE "), LicenseStatus::Inactive);
        assert_eq!(LicenseStatus::parse("expired"), LicenseStatus::Expired);
        assert_eq!(LicenseStatus::parse("Lapsed"), LicenseStatus::Expired);
    }

    #[test]
    fn test_status_parse_unknown_value() {
        assert_eq!(LicenseStatus::parse("Pending Review"), LicenseStatus::Unknown);
        assert_eq!(LicenseStatus::parse(""), LicenseStatus::Unknown);
    }

    #[test]
    fn test_summary_counts_accumulate() {
        let mut summary = ImportSummary::default();
        summary.record_outcome(RecordOutcome::Created);
        summary.record_outcome(RecordOutcome::Created);
        summary.record_outcome(RecordOutcome::Unchanged);
        summary.record_error(4, "missing license number");

        assert_eq!(summary.created, 2);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.errors[0].row, 4);
    }

    #[test]
    fn test_summary_serializes_to_expected_shape() {
        let mut summary = ImportSummary {
            rows_processed: 5,
            created: 4,
            ..Default::default()
        };
        summary.record_error(3, "bad date");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["rows_processed"], 5);
        assert_eq!(json["created"], 4);
        assert_eq!(json["errors"][0]["row"], 3);
        assert_eq!(json["errors"][0]["reason"], "bad date");
    }
}
