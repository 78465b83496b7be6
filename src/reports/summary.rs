//! Monthly Summary Report
//!
//! Normalizes every transaction to its monthly equivalent and totals income
//! against expenses.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::FailurePolicy;
use crate::error::TallyResult;
use crate::models::TransactionId;
use crate::services::{EvaluatedTransaction, TransactionService};

use super::{contribution, round_to, Contribution};

/// Optional first-occurrence date bounds, both inclusive
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryPeriod {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl SummaryPeriod {
    /// Check if `date` falls inside the period
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// A transaction left out of the totals
#[derive(Debug, Clone, Serialize)]
pub struct SkippedTransaction {
    pub id: TransactionId,
    pub description: String,
    pub reason: String,
}

/// Monthly totals
#[derive(Debug, Clone, Serialize)]
pub struct TransactionSummary {
    /// Sum of positive monthly amounts
    pub total_income: f64,
    /// Sum of the absolute negative monthly amounts
    pub total_expenses: f64,
    /// Income minus expenses
    pub net_amount: f64,
    /// Transactions that made it into the totals
    pub transaction_count: usize,
    /// Transactions skipped because they failed to evaluate
    pub skipped: Vec<SkippedTransaction>,
}

impl TransactionSummary {
    /// Evaluate the service owner's transactions and summarize them
    pub async fn generate(
        service: &TransactionService<'_>,
        period: SummaryPeriod,
        policy: FailurePolicy,
    ) -> TallyResult<Self> {
        let evaluated: Vec<_> = service
            .evaluate_all()
            .await?
            .into_iter()
            .filter(|e| period.contains(e.transaction.date))
            .collect();
        Self::from_evaluated(&evaluated, policy)
    }

    /// Summarize already evaluated transactions
    pub fn from_evaluated(
        evaluated: &[EvaluatedTransaction],
        policy: FailurePolicy,
    ) -> TallyResult<Self> {
        let mut total_income = 0.0;
        let mut total_expenses = 0.0;
        let mut transaction_count = 0;
        let mut skipped = Vec::new();

        for entry in evaluated {
            match contribution(entry, policy)? {
                Contribution::Monthly(monthly) => {
                    if monthly > 0.0 {
                        total_income += monthly;
                    } else {
                        total_expenses += monthly.abs();
                    }
                    transaction_count += 1;
                }
                Contribution::Skipped(reason) => skipped.push(SkippedTransaction {
                    id: entry.transaction.id,
                    description: entry.transaction.description.clone(),
                    reason,
                }),
            }
        }

        let net_amount = total_income - total_expenses;

        Ok(Self {
            total_income: round_to(total_income, 2),
            total_expenses: round_to(total_expenses, 2),
            net_amount: round_to(net_amount, 2),
            transaction_count,
            skipped,
        })
    }

    /// Format the summary for terminal display
    pub fn format_terminal(&self, currency: &str) -> String {
        let mut output = String::new();

        output.push_str("Monthly Summary\n");
        output.push_str(&"=".repeat(40));
        output.push('\n');
        output.push_str(&format!(
            "{:<20} {:>19}\n",
            "Income:",
            format!("{}{:.2}", currency, self.total_income)
        ));
        output.push_str(&format!(
            "{:<20} {:>19}\n",
            "Expenses:",
            format!("{}{:.2}", currency, self.total_expenses)
        ));
        output.push_str(&"-".repeat(40));
        output.push('\n');

        let sign = if self.net_amount < 0.0 { "-" } else { "" };
        output.push_str(&format!(
            "{:<20} {:>19}\n",
            "Net:",
            format!("{}{}{:.2}", sign, currency, self.net_amount.abs())
        ));
        output.push_str(&format!("\nTransactions: {}\n", self.transaction_count));

        if !self.skipped.is_empty() {
            output.push_str(&format!("\nSkipped ({}):\n", self.skipped.len()));
            for skipped in &self.skipped {
                output.push_str(&format!(
                    "  {} {}: {}\n",
                    skipped.id, skipped.description, skipped.reason
                ));
            }
        }

        output
    }
}
