//! Schedule CLI commands
//!
//! Projects transactions onto their recurrence to show upcoming and due
//! occurrences.

use chrono::Local;
use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_due_list, format_upcoming};
use crate::error::TallyResult;
use crate::services::{due_within, RecurrencePattern, TransactionFilter};
use crate::storage::Storage;

use super::{parse_date, transaction_service};

/// Schedule subcommands
#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Next occurrences of one transaction
    Upcoming {
        /// Transaction ID
        id: String,
        /// Number of occurrences to show
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
        /// Stop at this date
        #[arg(long)]
        until: Option<String>,
    },

    /// Transactions with an occurrence in the next N days
    Due {
        /// Window length in days
        #[arg(short, long, default_value = "7")]
        days: u32,
    },
}

/// Handle a schedule command
pub fn handle_schedule_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ScheduleCommands,
) -> TallyResult<()> {
    let service = transaction_service(storage, settings);
    let today = Local::now().date_naive();

    match cmd {
        ScheduleCommands::Upcoming { id, count, until } => {
            let txn = service.require(&id)?;

            let mut pattern = RecurrencePattern::for_transaction(&txn);
            if let Some(until) = until {
                pattern = pattern.with_end_date(parse_date(&until, &settings.date_format)?);
            }

            let mut occurrences = Vec::with_capacity(count);
            let mut next = pattern.first_on_or_after(today);
            while let Some((date, number)) = next {
                if occurrences.len() >= count {
                    break;
                }
                occurrences.push((date, number));
                next = pattern
                    .next_after(date)
                    .map(|o| (o.date, o.occurrence_number));
            }

            print!("{}", format_upcoming(&txn, &occurrences));
        }

        ScheduleCommands::Due { days } => {
            let transactions = service.list(TransactionFilter::new())?;
            let due = due_within(&transactions, today, days);
            print!("{}", format_due_list(&due, days));
        }
    }

    Ok(())
}
