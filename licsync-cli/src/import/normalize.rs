//! Cell-level normalization: license numbers and dates

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How to canonicalize license numbers. Source files are inconsistent in
/// numeric-vs-string representation ("07308" vs "7308" vs "7308.0"), so all
/// of those must land on the same key under either rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum LicenseNormalization {
    /// Strip leading zeros ("07308" -> "7308")
    StripLeadingZeros,
    /// Left-pad numeric license numbers with zeros to a fixed width
    ZeroPad { width: usize },
}

impl Default for LicenseNormalization {
    fn default() -> Self {
        LicenseNormalization::StripLeadingZeros
    }
}

/// Normalize a raw license-number cell into the canonical join key.
///
/// Steps: trim, drop a spreadsheet float artifact ("7308.0"), strip
/// separator punctuation, then apply the configured padding rule.
/// Returns an empty string for cells with no usable content.
pub fn normalize_license_number(raw: &str, rule: &LicenseNormalization) -> String {
    let mut s = raw.trim().to_string();

    // "7308.0" - numeric cell exported through a float formatter
    if let Some(dot) = s.find('.') {
        let (head, tail) = s.split_at(dot);
        if head.chars().all(|c| c.is_ascii_digit())
            && tail[1..].chars().all(|c| c == '0')
            && !head.is_empty()
        {
            s.truncate(dot);
        }
    }

    // Separators carry no identity: "12-345" and "12 345" are the same key
    s.retain(|c| !matches!(c, ' ' | '-' | '#' | '.' | '\t'));

    if s.is_empty() {
        return s;
    }

    match rule {
        LicenseNormalization::StripLeadingZeros => {
            if s.chars().all(|c| c.is_ascii_digit()) {
                let stripped = s.trim_start_matches('0');
                if stripped.is_empty() {
                    "0".to_string()
                } else {
                    stripped.to_string()
                }
            } else {
                s
            }
        }
        LicenseNormalization::ZeroPad { width } => {
            if s.chars().all(|c| c.is_ascii_digit()) && s.len() < *width {
                format!("{}{}", "0".repeat(width - s.len()), s)
            } else {
                s
            }
        }
    }
}

/// Date formats seen in OPLC exports when the cell is textual rather than a
/// native spreadsheet date. `%m/%d/%y` must come before `%m/%d/%Y`: chrono's
/// `%Y` accepts a 2-digit year verbatim, so "06/30/26" would otherwise land
/// in year 26. A 4-digit year fails `%y` (trailing digits) and falls through.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%m-%d-%Y", "%d-%b-%Y"];

/// Parse a textual date cell. Returns None if no recognized format matches.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // ISO datetime strings ("2026-06-30T00:00:00") - take the date part
    if s.len() >= 10 && s.as_bytes().get(10) == Some(&b'T') {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_number_variants_normalize_identically() {
        let rule = LicenseNormalization::StripLeadingZeros;
        assert_eq!(normalize_license_number("07308", &rule), "7308");
        assert_eq!(normalize_license_number("7308", &rule), "7308");
        assert_eq!(normalize_license_number("7308.0", &rule), "7308");
        assert_eq!(normalize_license_number(" 7308 ", &rule), "7308");
    }

    #[test]
    fn test_license_number_zero_pad() {
        let rule = LicenseNormalization::ZeroPad { width: 5 };
        assert_eq!(normalize_license_number("7308", &rule), "07308");
        assert_eq!(normalize_license_number("07308", &rule), "07308");
        assert_eq!(normalize_license_number("7308.0", &rule), "07308");
        assert_eq!(normalize_license_number("123456", &rule), "123456");
    }

    #[test]
    fn test_license_number_separators_stripped() {
        let rule = LicenseNormalization::StripLeadingZeros;
        assert_eq!(normalize_license_number("#12-345", &rule), "12345");
        assert_eq!(normalize_license_number("12 345", &rule), "12345");
    }

    #[test]
    fn test_license_number_non_numeric_kept_verbatim() {
        let rule = LicenseNormalization::StripLeadingZeros;
        assert_eq!(normalize_license_number("CPA-0042A", &rule), "CPA0042A");
    }

    #[test]
    fn test_license_number_all_zeros() {
        let rule = LicenseNormalization::StripLeadingZeros;
        assert_eq!(normalize_license_number("000", &rule), "0");
    }

    #[test]
    fn test_license_number_empty_cell() {
        let rule = LicenseNormalization::StripLeadingZeros;
        assert_eq!(normalize_license_number("   ", &rule), "");
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        assert_eq!(parse_date("2026-06-30"), Some(expected));
        assert_eq!(parse_date("06/30/2026"), Some(expected));
        assert_eq!(parse_date("06/30/26"), Some(expected));
        assert_eq!(parse_date("06-30-2026"), Some(expected));
        assert_eq!(parse_date("30-Jun-2026"), Some(expected));
        assert_eq!(parse_date("2026-06-30T00:00:00"), Some(expected));
    }

    #[test]
    fn test_parse_date_two_digit_year_gets_modern_century() {
        assert_eq!(
            parse_date("06/30/26"),
            NaiveDate::from_ymd_opt(2026, 6, 30)
        );
        assert_eq!(
            parse_date("06/30/99"),
            NaiveDate::from_ymd_opt(1999, 6, 30)
        );
        // 4-digit years still take the %Y path
        assert_eq!(
            parse_date("06/30/2026"),
            NaiveDate::from_ymd_opt(2026, 6, 30)
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date("13/45/2026"), None);
        assert_eq!(parse_date(""), None);
    }
}
