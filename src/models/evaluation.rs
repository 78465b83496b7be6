//! Evaluation results
//!
//! The transient output of evaluating a transaction: its raw amount, its
//! income/expense classification and its monthly equivalent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Income or expense, inferred from the sign of the amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Positive amounts are income; zero and negative amounts are expenses
    pub fn from_amount(amount: f64) -> Self {
        if amount > 0.0 {
            Self::Income
        } else {
            Self::Expense
        }
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }

    pub fn is_expense(&self) -> bool {
        matches!(self, Self::Expense)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

/// Result of evaluating one transaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Evaluated amount for one period
    pub amount: f64,

    /// Classification of `amount`
    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Monthly equivalent of `amount`, sign preserved
    pub normalized_amount: f64,
}
