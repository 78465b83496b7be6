//! Display formatting for terminal output
//!
//! Provides utilities for formatting transactions, evaluations, categories
//! and schedules for terminal display.

pub mod category;
pub mod schedule;
pub mod transaction;

pub use category::{format_category_details, format_category_list};
pub use schedule::{format_due_list, format_upcoming};
pub use transaction::{
    format_evaluation, format_frequency_table, format_transaction_details,
    format_transaction_register,
};

/// Format an amount with the currency symbol, sign in front (`-$12.50`)
pub fn format_amount(amount: f64, currency: &str) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}{:.2}", sign, currency, amount.abs())
}

/// Pad or cut `s` to exactly `max_len` characters
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
