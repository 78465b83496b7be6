//! Transaction display formatting
//!
//! Register and detail views of evaluated transactions, evaluation output,
//! and the frequency table.

use crate::error::EvaluationError;
use crate::models::{EvaluationResult, Frequency, Transaction};
use crate::services::EvaluatedTransaction;

use super::{format_amount, truncate};

fn amount_columns(
    result: &Result<EvaluationResult, EvaluationError>,
    currency: &str,
) -> (String, String, String) {
    match result {
        Ok(result) => (
            format_amount(result.amount, currency),
            result.kind.to_string(),
            format_amount(result.normalized_amount, currency),
        ),
        Err(_) => ("error".to_string(), "-".to_string(), "-".to_string()),
    }
}

/// Format a single evaluated transaction (register row)
pub fn format_transaction_row(entry: &EvaluatedTransaction, currency: &str) -> String {
    let txn = &entry.transaction;
    let (amount, kind, monthly) = amount_columns(&entry.result, currency);

    format!(
        "{:12} {} {} {:>12} {:7} {:9} {:>12}",
        txn.id.to_string(),
        txn.date.format("%Y-%m-%d"),
        truncate(&txn.description, 24),
        amount,
        kind,
        txn.frequency.as_str(),
        monthly
    )
}

/// Format a list of evaluated transactions as a register
pub fn format_transaction_register(entries: &[EvaluatedTransaction], currency: &str) -> String {
    if entries.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:12} {:10} {:24} {:>12} {:7} {:9} {:>12}\n",
        "ID", "Date", "Description", "Amount", "Type", "Frequency", "Monthly"
    ));
    output.push_str(&"-".repeat(94));
    output.push('\n');

    for entry in entries {
        output.push_str(&format_transaction_row(entry, currency));
        output.push('\n');
    }

    let failed = entries.iter().filter(|e| e.result.is_err()).count();
    if failed > 0 {
        output.push_str(&format!(
            "\n{} transaction(s) failed to evaluate; see 'tally transaction show <id>'\n",
            failed
        ));
    }

    output
}

/// Format transaction details for display
pub fn format_transaction_details(
    txn: &Transaction,
    result: &Result<EvaluationResult, EvaluationError>,
    category_name: Option<&str>,
    currency: &str,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Reference:   {}\n", txn.reference_token()));
    output.push_str(&format!("Description: {}\n", txn.description));
    output.push_str(&format!("Date:        {}\n", txn.date.format("%Y-%m-%d")));
    output.push_str(&format!("Expression:  {}\n", txn.expression));
    output.push_str(&format!(
        "Frequency:   {} ({})\n",
        txn.frequency.display_label(),
        txn.frequency.cron_expression()
    ));

    match result {
        Ok(result) => {
            output.push_str(&format!(
                "Amount:      {}\n",
                format_amount(result.amount, currency)
            ));
            output.push_str(&format!("Type:        {}\n", result.kind));
            output.push_str(&format!(
                "Monthly:     {}\n",
                format_amount(result.normalized_amount, currency)
            ));
        }
        Err(err) => output.push_str(&format!("Error:       {}\n", err)),
    }

    match category_name {
        Some(name) => output.push_str(&format!("Category:    {}\n", name)),
        None => output.push_str("Category:    (uncategorized)\n"),
    }

    if !txn.notes.is_empty() {
        output.push_str(&format!("Notes:       {}\n", txn.notes));
    }

    output
}

/// Format the result of evaluating an expression
pub fn format_evaluation(
    expression: &str,
    frequency: Frequency,
    result: &EvaluationResult,
    currency: &str,
) -> String {
    format!(
        "{} = {}\nType:    {}\nMonthly: {} ({})\n",
        expression,
        result.amount,
        result.kind,
        format_amount(result.normalized_amount, currency),
        frequency.normalized_amount_display(result.amount)
    )
}

/// Format the supported frequencies with their monthly factors
pub fn format_frequency_table() -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:10} {:10} {:>10}  {}\n",
        "Token", "Label", "x Monthly", "Cron"
    ));
    output.push_str(&"-".repeat(48));
    output.push('\n');

    for frequency in Frequency::all() {
        output.push_str(&format!(
            "{:10} {:10} {:>10.4}  {}\n",
            frequency.as_str(),
            frequency.display_label(),
            frequency.monthly_factor(),
            frequency.cron_expression()
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Expression, OwnerId, TransactionKind};
    use chrono::NaiveDate;

    fn rent() -> Transaction {
        Transaction::new(
            OwnerId::new(),
            "Rent",
            Expression::new("-1200").unwrap(),
            Frequency::Month,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        )
    }

    fn rent_result() -> EvaluationResult {
        EvaluationResult {
            amount: -1200.0,
            kind: TransactionKind::Expense,
            normalized_amount: -1200.0,
        }
    }

    #[test]
    fn test_format_register() {
        let entries = vec![EvaluatedTransaction {
            transaction: rent(),
            result: Ok(rent_result()),
        }];
        let output = format_transaction_register(&entries, "$");

        assert!(output.contains("Description"));
        assert!(output.contains("2025-01-15"));
        assert!(output.contains("-$1200.00"));
        assert!(output.contains("expense"));
        assert!(!output.contains("failed to evaluate"));
    }

    #[test]
    fn test_format_register_marks_failures() {
        let entries = vec![EvaluatedTransaction {
            transaction: rent(),
            result: Err(EvaluationError::ReferenceNotFound("abc".into())),
        }];
        let output = format_transaction_register(&entries, "$");
        assert!(output.contains("error"));
        assert!(output.contains("1 transaction(s) failed to evaluate"));
    }

    #[test]
    fn test_format_empty_register() {
        assert_eq!(format_transaction_register(&[], "$"), "No transactions found.\n");
    }

    #[test]
    fn test_format_details() {
        let txn = rent();
        let output = format_transaction_details(&txn, &Ok(rent_result()), Some("Housing"), "$");

        assert!(output.contains("Expression:  -1200"));
        assert!(output.contains("Category:    Housing"));
        assert!(output.contains(&txn.reference_token()));
        assert!(output.contains("0 0 1 * *"));
    }

    #[test]
    fn test_format_evaluation() {
        let result = EvaluationResult {
            amount: 1200.0,
            kind: TransactionKind::Income,
            normalized_amount: 100.0,
        };
        let output = format_evaluation("100 * 12", Frequency::Year, &result, "$");
        assert!(output.starts_with("100 * 12 = 1200\n"));
        assert!(output.contains("100.00 per month"));
    }

    #[test]
    fn test_frequency_table_lists_all() {
        let output = format_frequency_table();
        for frequency in Frequency::all() {
            assert!(output.contains(frequency.as_str()));
        }
    }
}
