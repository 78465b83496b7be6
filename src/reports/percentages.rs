//! Budget Percentages Report
//!
//! Shares of the total monthly volume, by category and by category flow.
//! Amounts are absolute monthly equivalents, so income and expenses both
//! count towards the total.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::FailurePolicy;
use crate::error::TallyResult;
use crate::models::{Category, CategoryFlow, CategoryId, TransactionKind};
use crate::services::{CategoryService, EvaluatedTransaction, TransactionService};

use super::{contribution, round_to, Contribution};

/// Share of one category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPercentage {
    /// `None` for uncategorized transactions
    pub category_id: Option<CategoryId>,
    pub category_name: String,
    pub category_color: Option<String>,
    pub flow: CategoryFlow,
    /// Percentage of the total (0-100)
    pub percentage: f64,
    /// Absolute monthly amount
    pub amount: f64,
}

/// Share of one flow
#[derive(Debug, Clone, Serialize)]
pub struct FlowPercentage {
    pub flow: CategoryFlow,
    pub percentage: f64,
    pub amount: f64,
}

/// Percentage breakdown of the monthly volume
#[derive(Debug, Clone, Serialize)]
pub struct BudgetPercentages {
    pub category_percentages: Vec<CategoryPercentage>,
    pub flow_percentages: Vec<FlowPercentage>,
    pub total_amount: f64,
    /// Transactions left out because they failed to evaluate
    pub skipped: usize,
}

fn percentage_of(amount: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        round_to(amount / total * 100.0, 1)
    }
}

fn kind_flow(kind: TransactionKind) -> CategoryFlow {
    match kind {
        TransactionKind::Income => CategoryFlow::Income,
        TransactionKind::Expense => CategoryFlow::Expense,
    }
}

impl BudgetPercentages {
    /// Evaluate the service owner's transactions and break them down
    pub async fn generate(
        service: &TransactionService<'_>,
        categories: &CategoryService<'_>,
        policy: FailurePolicy,
    ) -> TallyResult<Self> {
        let evaluated = service.evaluate_all().await?;
        Self::from_evaluated(&evaluated, &categories.list()?, policy)
    }

    /// Break down already evaluated transactions
    ///
    /// A transaction whose category no longer exists counts as
    /// uncategorized. Uncategorized amounts go to the flow matching their
    /// income/expense kind.
    pub fn from_evaluated(
        evaluated: &[EvaluatedTransaction],
        categories: &[Category],
        policy: FailurePolicy,
    ) -> TallyResult<Self> {
        let category_map: HashMap<CategoryId, &Category> =
            categories.iter().map(|c| (c.id, c)).collect();

        // (category or none, flow) -> absolute monthly amount
        let mut by_category: HashMap<(Option<CategoryId>, CategoryFlow), f64> = HashMap::new();
        let mut skipped = 0;

        for entry in evaluated {
            let monthly = match contribution(entry, policy)? {
                Contribution::Monthly(monthly) => monthly,
                Contribution::Skipped(_) => {
                    skipped += 1;
                    continue;
                }
            };
            if monthly == 0.0 {
                continue;
            }

            let category = entry
                .transaction
                .category_id
                .and_then(|id| category_map.get(&id));
            let key = match category {
                Some(category) => (Some(category.id), category.flow),
                None => (None, kind_flow(TransactionKind::from_amount(monthly))),
            };
            *by_category.entry(key).or_insert(0.0) += monthly.abs();
        }

        let total: f64 = by_category.values().sum();

        let mut by_flow: HashMap<CategoryFlow, f64> = HashMap::new();
        for ((_, flow), amount) in &by_category {
            *by_flow.entry(*flow).or_insert(0.0) += amount;
        }

        let mut category_percentages: Vec<_> = by_category
            .into_iter()
            .map(|((id, flow), amount)| {
                let category = id.and_then(|id| category_map.get(&id));
                CategoryPercentage {
                    category_id: id,
                    category_name: category
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| "Uncategorized".to_string()),
                    category_color: category.and_then(|c| c.color.clone()),
                    flow,
                    percentage: percentage_of(amount, total),
                    amount: round_to(amount, 2),
                }
            })
            .collect();
        category_percentages.sort_by(|a, b| {
            b.amount
                .total_cmp(&a.amount)
                .then_with(|| a.category_name.cmp(&b.category_name))
        });

        let mut flow_percentages: Vec<_> = by_flow
            .into_iter()
            .map(|(flow, amount)| FlowPercentage {
                flow,
                percentage: percentage_of(amount, total),
                amount: round_to(amount, 2),
            })
            .collect();
        flow_percentages.sort_by(|a, b| {
            b.amount
                .total_cmp(&a.amount)
                .then_with(|| a.flow.as_str().cmp(b.flow.as_str()))
        });

        Ok(Self {
            category_percentages,
            flow_percentages,
            total_amount: round_to(total, 2),
            skipped,
        })
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self, currency: &str) -> String {
        let mut output = String::new();

        output.push_str("Budget Percentages\n");
        output.push_str(&"=".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "Total monthly volume: {}{:.2}\n\n",
            currency, self.total_amount
        ));

        output.push_str(&format!(
            "{:<30} {:<10} {:>12} {:>6}\n",
            "Category", "Flow", "Amount", "%"
        ));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for row in &self.category_percentages {
            output.push_str(&format!(
                "{:<30} {:<10} {:>12} {:>5.1}%\n",
                row.category_name,
                row.flow.label(),
                format!("{}{:.2}", currency, row.amount),
                row.percentage
            ));
        }

        output.push_str(&format!("\n{:<41} {:>12} {:>6}\n", "Flow", "Amount", "%"));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for row in &self.flow_percentages {
            output.push_str(&format!(
                "{:<41} {:>12} {:>5.1}%\n",
                row.flow.label(),
                format!("{}{:.2}", currency, row.amount),
                row.percentage
            ));
        }

        if self.skipped > 0 {
            output.push_str(&format!(
                "\n{} transaction(s) skipped (failed to evaluate)\n",
                self.skipped
            ));
        }

        output
    }
}
