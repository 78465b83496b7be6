//! Export module for Tally
//!
//! Provides data export in multiple formats:
//! - CSV: evaluated transactions (spreadsheet-compatible)
//! - JSON: machine-readable full data export
//! - YAML: human-readable full data export

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_transactions_csv;
pub use json::{export_full_json, ExportMetadata, FullExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_full_yaml;
