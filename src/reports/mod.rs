//! Reports module for Tally
//!
//! Aggregations over evaluated transactions: the monthly income/expense
//! summary and the percentage breakdown by category and flow.

pub mod percentages;
pub mod summary;

pub use percentages::{BudgetPercentages, CategoryPercentage, FlowPercentage};
pub use summary::{SkippedTransaction, SummaryPeriod, TransactionSummary};

use tracing::warn;

use crate::config::FailurePolicy;
use crate::error::TallyResult;
use crate::services::EvaluatedTransaction;

/// Round half away from zero to `places` decimals
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// What an aggregation should do with one evaluated transaction
pub(crate) enum Contribution {
    /// Monthly amount to add
    Monthly(f64),
    /// Left out, with the reason
    Skipped(String),
}

/// Decide how an evaluated transaction contributes to a report
///
/// A non-finite arithmetic result counts as zero. Other failures are skipped
/// or abort the report, depending on `policy`.
pub(crate) fn contribution(
    evaluated: &EvaluatedTransaction,
    policy: FailurePolicy,
) -> TallyResult<Contribution> {
    match &evaluated.result {
        Ok(result) => Ok(Contribution::Monthly(result.normalized_amount)),
        Err(err) if err.is_non_numeric() => Ok(Contribution::Monthly(0.0)),
        Err(err) => match policy {
            FailurePolicy::Abort => Err(err.clone().into()),
            FailurePolicy::Skip => {
                warn!(
                    id = %evaluated.transaction.id,
                    error = %err,
                    "Skipping transaction that failed to evaluate"
                );
                Ok(Contribution::Skipped(err.to_string()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(433.333_333, 2), 433.33);
        assert_eq!(round_to(35.75, 1), 35.8);
        assert_eq!(round_to(-2.675_1, 2), -2.68);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}
