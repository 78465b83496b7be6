//! Expression CLI commands
//!
//! `tally eval` evaluates an ad-hoc expression against the stored
//! transactions; `tally frequencies` lists the supported frequencies.

use crate::config::Settings;
use crate::display::{format_evaluation, format_frequency_table};
use crate::error::TallyResult;
use crate::models::Frequency;
use crate::storage::Storage;

use super::transaction_service;

/// Handle `tally eval <expression>`
pub async fn handle_eval_command(
    storage: &Storage,
    settings: &Settings,
    expression: &str,
    frequency: Option<Frequency>,
) -> TallyResult<()> {
    let frequency = frequency.unwrap_or(settings.default_frequency);
    let service = transaction_service(storage, settings);

    let result = service.preview(expression, frequency).await?;
    print!(
        "{}",
        format_evaluation(expression.trim(), frequency, &result, &settings.currency_symbol)
    );

    Ok(())
}

/// Handle `tally frequencies`
pub fn handle_frequencies_command() {
    print!("{}", format_frequency_table());
}
