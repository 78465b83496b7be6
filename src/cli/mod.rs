//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod category;
pub mod eval;
pub mod export;
pub mod report;
pub mod schedule;
pub mod transaction;

pub use category::{handle_category_command, CategoryCommands};
pub use eval::{handle_eval_command, handle_frequencies_command};
pub use export::{handle_export_command, ExportCommands};
pub use report::{handle_report_command, ReportCommands};
pub use schedule::{handle_schedule_command, ScheduleCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use chrono::NaiveDate;

use crate::config::Settings;
use crate::error::{TallyError, TallyResult};
use crate::models::Frequency;
use crate::services::TransactionService;
use crate::storage::Storage;

/// clap value parser for frequency tokens
pub fn parse_frequency(value: &str) -> Result<Frequency, String> {
    Frequency::parse(value).map_err(|_| {
        let tokens: Vec<_> = Frequency::all().iter().map(|f| f.as_str()).collect();
        format!("expected one of: {}", tokens.join(", "))
    })
}

/// Parse a date in the configured format, falling back to ISO `YYYY-MM-DD`
pub fn parse_date(value: &str, format: &str) -> TallyResult<NaiveDate> {
    NaiveDate::parse_from_str(value, format)
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|_| {
            TallyError::Validation(format!(
                "Invalid date '{}'. Use {} or YYYY-MM-DD",
                value, format
            ))
        })
}

/// A transaction service for the configured owner and depth cap
pub(crate) fn transaction_service<'a>(
    storage: &'a Storage,
    settings: &Settings,
) -> TransactionService<'a> {
    TransactionService::new(storage, settings.owner_id).with_max_depth(settings.max_reference_depth)
}
