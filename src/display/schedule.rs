//! Schedule display formatting
//!
//! Upcoming occurrence dates of one transaction and the list of
//! transactions due within a window.

use chrono::NaiveDate;

use crate::models::Transaction;
use crate::services::DueTransaction;

use super::truncate;

/// Format the upcoming occurrences of a transaction
pub fn format_upcoming(txn: &Transaction, occurrences: &[(NaiveDate, u32)]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} ({}, {})\n",
        txn.description,
        txn.frequency.display_label(),
        txn.expression
    ));

    if occurrences.is_empty() {
        output.push_str("  No upcoming occurrences.\n");
        return output;
    }

    for (date, number) in occurrences {
        output.push_str(&format!(
            "  #{:<5} {} {}\n",
            number,
            date.format("%Y-%m-%d"),
            date.format("%a")
        ));
    }

    output
}

/// Format the transactions due within a window
pub fn format_due_list(due: &[DueTransaction<'_>], days: u32) -> String {
    if due.is_empty() {
        return format!("Nothing due in the next {} day(s).\n", days);
    }

    let mut output = String::new();
    output.push_str(&format!("Due in the next {} day(s):\n\n", days));
    output.push_str(&format!(
        "{:10} {:>6} {:24} {:9} {}\n",
        "Date", "In", "Description", "Frequency", "Expression"
    ));
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for entry in due {
        let when = match entry.days_until_due {
            0 => "today".to_string(),
            1 => "1 day".to_string(),
            n => format!("{} days", n),
        };
        output.push_str(&format!(
            "{} {:>6} {} {:9} {}\n",
            entry.due_date.format("%Y-%m-%d"),
            when,
            truncate(&entry.transaction.description, 24),
            entry.transaction.frequency.as_str(),
            entry.transaction.expression
        ));
    }

    output
}
