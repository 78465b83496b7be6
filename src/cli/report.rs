//! Report CLI commands
//!
//! Monthly summary and budget percentage reports.

use clap::Subcommand;

use crate::config::{FailurePolicy, Settings};
use crate::error::TallyResult;
use crate::reports::{BudgetPercentages, SummaryPeriod, TransactionSummary};
use crate::services::CategoryService;
use crate::storage::Storage;

use super::{parse_date, transaction_service};

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Monthly income, expenses and net amount
    Summary {
        /// Only transactions first occurring on or after this date
        #[arg(long)]
        from: Option<String>,
        /// Only transactions first occurring on or before this date
        #[arg(long)]
        to: Option<String>,
        /// What to do with transactions that fail to evaluate (skip, abort)
        #[arg(long)]
        on_error: Option<FailurePolicy>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Share of the monthly volume per category and flow
    Percentages {
        /// What to do with transactions that fail to evaluate (skip, abort)
        #[arg(long)]
        on_error: Option<FailurePolicy>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn print_json<T: serde::Serialize>(value: &T) -> TallyResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Handle a report command
pub async fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ReportCommands,
) -> TallyResult<()> {
    let service = transaction_service(storage, settings);
    let currency = settings.currency_symbol.as_str();

    match cmd {
        ReportCommands::Summary {
            from,
            to,
            on_error,
            json,
        } => {
            let period = SummaryPeriod {
                start_date: from
                    .map(|d| parse_date(&d, &settings.date_format))
                    .transpose()?,
                end_date: to
                    .map(|d| parse_date(&d, &settings.date_format))
                    .transpose()?,
            };
            let policy = on_error.unwrap_or(settings.summary_failure_policy);

            let summary = TransactionSummary::generate(&service, period, policy).await?;
            if json {
                print_json(&summary)?;
            } else {
                print!("{}", summary.format_terminal(currency));
            }
        }

        ReportCommands::Percentages { on_error, json } => {
            let policy = on_error.unwrap_or(settings.summary_failure_policy);
            let categories = CategoryService::new(storage);

            let report = BudgetPercentages::generate(&service, &categories, policy).await?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", report.format_terminal(currency));
            }
        }
    }

    Ok(())
}
