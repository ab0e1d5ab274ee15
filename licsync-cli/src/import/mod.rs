//! OPLC spreadsheet import pipeline
//!
//! Two halves: the parser turns a monthly export file into canonical
//! records plus row-level errors, and the engine reconciles those records
//! against the licensee store (create / update / unchanged, never delete).

pub mod engine;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod schema;

pub use engine::{ImportOptions, reconcile};
pub use models::{CanonicalRecord, ImportSummary, LicenseStatus};
pub use normalize::normalize_license_number;
pub use parser::parse_file;
pub use schema::SchemaConfig;
