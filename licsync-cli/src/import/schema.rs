//! Header alias resolution for OPLC spreadsheet layouts
//!
//! Monthly files vary in column order and header wording. The schema maps
//! recognized header aliases to canonical fields; resolution happens once
//! per import, not per cell.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::models::ImportError;
use super::normalize::LicenseNormalization;

/// Canonical field names used as alias-table keys
pub mod fields {
    pub const LICENSE_NUMBER: &str = "license_number";
    pub const FULL_NAME: &str = "full_name";
    pub const LICENSE_TYPE: &str = "license_type";
    pub const ISSUE_DATE: &str = "issue_date";
    pub const EXPIRATION_DATE: &str = "expiration_date";
    pub const ADDRESS: &str = "address";
    pub const STATUS: &str = "status";
}

static DEFAULT_ALIASES: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        (
            fields::LICENSE_NUMBER,
            vec!["license number", "license #", "licenseno", "license no", "lic number"],
        ),
        (
            fields::FULL_NAME,
            vec!["full name/business name", "full name", "name", "licensee name"],
        ),
        (fields::LICENSE_TYPE, vec!["license type", "profession"]),
        (fields::ISSUE_DATE, vec!["issue date", "issued", "date issued"]),
        (
            fields::EXPIRATION_DATE,
            vec!["expiration date", "expiry date", "expires", "expiration"],
        ),
        (fields::ADDRESS, vec!["address", "mailing address", "business address"]),
        (fields::STATUS, vec!["license status", "status"]),
    ])
});

fn default_aliases() -> HashMap<String, Vec<String>> {
    DEFAULT_ALIASES
        .iter()
        .map(|(field, names)| {
            (
                field.to_string(),
                names.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

/// Schema description for one import: which header spellings map to which
/// canonical field, and how license numbers are canonicalized. A config
/// file that sets `aliases` replaces the built-in table wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// canonical field name -> recognized header aliases
    #[serde(default = "default_aliases")]
    pub aliases: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub license_normalization: LicenseNormalization,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
            license_normalization: LicenseNormalization::default(),
        }
    }
}

impl SchemaConfig {
    fn aliases_for(&self, field: &str) -> &[String] {
        self.aliases.get(field).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Column indices resolved from the header row. Only `license_number` is
/// required; every other field degrades to "not present in this file".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub license_number: usize,
    pub full_name: Option<usize>,
    pub license_type: Option<usize>,
    pub issue_date: Option<usize>,
    pub expiration_date: Option<usize>,
    pub address: Option<usize>,
    pub status: Option<usize>,
}

/// Collapse a header cell for comparison: lowercase, alphanumerics only.
/// "License #", "license number" and "LicenseNo" all collapse the same way.
fn collapse(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn find_column(headers: &[String], aliases: &[String]) -> Option<usize> {
    for alias in aliases {
        let want = collapse(alias);
        if let Some(idx) = headers.iter().position(|h| collapse(h) == want) {
            return Some(idx);
        }
    }
    None
}

/// Resolve the header row against the schema. Fails fast with a schema
/// error when `license_number` cannot be found - without it no row identity
/// is derivable and partial results would be meaningless.
pub fn resolve_columns(
    headers: &[String],
    schema: &SchemaConfig,
) -> Result<ResolvedColumns, ImportError> {
    let license_number = find_column(headers, schema.aliases_for(fields::LICENSE_NUMBER))
        .ok_or_else(|| ImportError::Schema {
            missing: vec![fields::LICENSE_NUMBER.to_string()],
        })?;

    Ok(ResolvedColumns {
        license_number,
        full_name: find_column(headers, schema.aliases_for(fields::FULL_NAME)),
        license_type: find_column(headers, schema.aliases_for(fields::LICENSE_TYPE)),
        issue_date: find_column(headers, schema.aliases_for(fields::ISSUE_DATE)),
        expiration_date: find_column(headers, schema.aliases_for(fields::EXPIRATION_DATE)),
        address: find_column(headers, schema.aliases_for(fields::ADDRESS)),
        status: find_column(headers, schema.aliases_for(fields::STATUS)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_exact_headers() {
        let cols = resolve_columns(
            &headers(&["License Number", "Full Name", "Expiration Date", "License Status"]),
            &SchemaConfig::default(),
        )
        .unwrap();

        assert_eq!(cols.license_number, 0);
        assert_eq!(cols.full_name, Some(1));
        assert_eq!(cols.expiration_date, Some(2));
        assert_eq!(cols.status, Some(3));
        assert_eq!(cols.address, None);
    }

    #[test]
    fn test_resolve_is_case_and_punctuation_insensitive() {
        for header in ["LICENSE NUMBER", "License #", "LicenseNo", "  license number  "] {
            let cols = resolve_columns(&headers(&[header]), &SchemaConfig::default()).unwrap();
            assert_eq!(cols.license_number, 0, "header {:?} should resolve", header);
        }
    }

    #[test]
    fn test_missing_license_column_is_schema_error() {
        let err = resolve_columns(
            &headers(&["Full Name", "Expiration Date"]),
            &SchemaConfig::default(),
        )
        .unwrap_err();

        match err {
            ImportError::Schema { missing } => {
                assert_eq!(missing, vec!["license_number".to_string()])
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_alias_table() {
        let mut schema = SchemaConfig::default();
        schema
            .aliases
            .insert(fields::LICENSE_NUMBER.to_string(), vec!["Permit ID".to_string()]);

        let cols = resolve_columns(&headers(&["Permit ID"]), &schema).unwrap();
        assert_eq!(cols.license_number, 0);
    }
}
