//! CLI commands for data export
//!
//! Writes exports to the given path, or to a timestamped file in the
//! exports directory.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;

use crate::config::Settings;
use crate::error::{TallyError, TallyResult};
use crate::export::{export_full_json, export_full_yaml, export_transactions_csv};
use crate::storage::Storage;

use super::transaction_service;

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export evaluated transactions to CSV
    Csv {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export all data to JSON
    Json {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Export all data to YAML (human-readable)
    Yaml {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn output_path(storage: &Storage, output: Option<PathBuf>, extension: &str) -> TallyResult<PathBuf> {
    if let Some(path) = output {
        return Ok(path);
    }

    let dir = storage.paths().export_dir();
    fs::create_dir_all(&dir).map_err(|e| {
        TallyError::Export(format!(
            "Failed to create export directory {}: {}",
            dir.display(),
            e
        ))
    })?;
    Ok(dir.join(format!(
        "tally-{}.{}",
        Local::now().format("%Y%m%d-%H%M%S"),
        extension
    )))
}

fn create_writer(output: &PathBuf) -> TallyResult<BufWriter<File>> {
    let file = File::create(output).map_err(|e| {
        TallyError::Export(format!(
            "Failed to create file {}: {}",
            output.display(),
            e
        ))
    })?;
    Ok(BufWriter::new(file))
}

/// Handle export commands
pub async fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExportCommands,
) -> TallyResult<()> {
    match cmd {
        ExportCommands::Csv { output } => {
            let output = output_path(storage, output, "csv")?;
            let service = transaction_service(storage, settings);
            let entries = service.evaluate_all().await?;
            let categories = storage.categories.get_all()?;

            export_transactions_csv(&entries, &categories, create_writer(&output)?)?;
            println!(
                "Exported {} transactions to: {}",
                entries.len(),
                output.display()
            );
        }

        ExportCommands::Json { output, pretty } => {
            let output = output_path(storage, output, "json")?;
            export_full_json(storage, create_writer(&output)?, pretty)?;
            println!("Full data exported to: {}", output.display());
        }

        ExportCommands::Yaml { output } => {
            let output = output_path(storage, output, "yaml")?;
            export_full_yaml(storage, create_writer(&output)?)?;
            println!("Full data exported to: {}", output.display());
        }
    }

    Ok(())
}
