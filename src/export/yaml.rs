//! YAML Export functionality
//!
//! Exports all data to YAML format for a human-readable backup.

use std::io::Write;

use crate::error::{TallyError, TallyResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

fn export_error(e: impl std::fmt::Display) -> TallyError {
    TallyError::Export(e.to_string())
}

/// Export all data to YAML format
pub fn export_full_yaml<W: Write>(storage: &Storage, mut writer: W) -> TallyResult<()> {
    let export = FullExport::from_storage(storage)?;

    // Header comment
    writeln!(writer, "# Tally Full Data Export").map_err(export_error)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_error)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(export_error)?;
    writeln!(writer).map_err(export_error)?;

    serde_yaml::to_writer(writer, &export).map_err(export_error)?;

    Ok(())
}
