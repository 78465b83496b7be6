//! CSV Export functionality
//!
//! Exports evaluated transactions to a spreadsheet-compatible CSV file.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::error::{TallyError, TallyResult};
use crate::models::Category;
use crate::reports::round_to;
use crate::services::EvaluatedTransaction;

/// One CSV row; failed evaluations leave the amount columns empty
#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Expression")]
    expression: &'a str,
    #[serde(rename = "Frequency")]
    frequency: &'static str,
    #[serde(rename = "Amount")]
    amount: Option<f64>,
    #[serde(rename = "Type")]
    kind: Option<String>,
    #[serde(rename = "Monthly Amount")]
    monthly_amount: Option<f64>,
    #[serde(rename = "Category")]
    category: &'a str,
}

/// Export evaluated transactions to CSV
pub fn export_transactions_csv<W: Write>(
    entries: &[EvaluatedTransaction],
    categories: &[Category],
    writer: W,
) -> TallyResult<()> {
    let category_names: HashMap<_, _> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let mut csv_writer = csv::Writer::from_writer(writer);

    for entry in entries {
        let txn = &entry.transaction;
        let result = entry.result.as_ref().ok();

        let category = match txn.category_id {
            Some(cat_id) => category_names.get(&cat_id).copied().unwrap_or("Unknown"),
            None => "",
        };

        csv_writer
            .serialize(TransactionRow {
                id: txn.id.as_uuid().to_string(),
                date: txn.date.format("%Y-%m-%d").to_string(),
                description: &txn.description,
                expression: txn.expression.as_str(),
                frequency: txn.frequency.as_str(),
                amount: result.map(|r| r.amount),
                kind: result.map(|r| r.kind.to_string()),
                monthly_amount: result.map(|r| round_to(r.normalized_amount, 2)),
                category,
            })
            .map_err(|e| TallyError::Export(e.to_string()))?;
    }

    csv_writer
        .flush()
        .map_err(|e| TallyError::Export(e.to_string()))?;

    Ok(())
}
