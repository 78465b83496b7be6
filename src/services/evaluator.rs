//! Transaction evaluator
//!
//! Runs the full pipeline for one transaction: resolve references, evaluate
//! the arithmetic, classify income/expense and normalize to a monthly
//! amount. Any failure is wrapped exactly once as
//! `Cannot evaluate transaction expression: <reason>`.

use tracing::error;

use crate::error::EvaluationError;
use crate::models::{EvaluationResult, Frequency, OwnerId, Transaction, TransactionKind};

use super::arithmetic;
use super::resolver::{ReferenceResolver, TransactionLookup};

/// What the evaluator needs to know about a transaction
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'r> {
    pub expression: &'r str,
    pub frequency: Frequency,

    /// Without an owner, references cannot be resolved
    pub owner_id: Option<&'r OwnerId>,
}

impl<'r> EvaluationRequest<'r> {
    pub fn new(expression: &'r str, frequency: Frequency) -> Self {
        Self {
            expression,
            frequency,
            owner_id: None,
        }
    }

    pub fn for_owner(mut self, owner_id: &'r OwnerId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }
}

impl<'r> From<&'r Transaction> for EvaluationRequest<'r> {
    fn from(transaction: &'r Transaction) -> Self {
        Self::new(transaction.expression.as_str(), transaction.frequency)
            .for_owner(&transaction.owner_id)
    }
}

/// Evaluates transaction expressions end to end
pub struct TransactionEvaluator<'a> {
    resolver: ReferenceResolver<'a>,
}

impl<'a> TransactionEvaluator<'a> {
    pub fn new(lookup: &'a dyn TransactionLookup) -> Self {
        Self {
            resolver: ReferenceResolver::new(lookup),
        }
    }

    /// Override the resolver's reference depth cap
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self {
            resolver: self.resolver.with_max_depth(max_depth),
        }
    }

    /// Evaluate an expression to its raw amount
    ///
    /// References are only resolved when an owner is given and the
    /// expression contains `$`; otherwise the text goes straight to the
    /// arithmetic evaluator, which rejects any leftover `$`.
    pub async fn evaluate_expression(
        &self,
        expression: &str,
        owner_id: Option<&OwnerId>,
    ) -> Result<f64, EvaluationError> {
        self.compute(expression, owner_id).await.map_err(|err| {
            error!(expression = %expression, error = %err, "Failed to evaluate transaction expression");
            EvaluationError::in_transaction(expression, err)
        })
    }

    /// Evaluate a transaction to its amount, kind and monthly amount
    pub async fn evaluate(
        &self,
        request: EvaluationRequest<'_>,
    ) -> Result<EvaluationResult, EvaluationError> {
        let amount = self
            .evaluate_expression(request.expression, request.owner_id)
            .await?;

        Ok(EvaluationResult {
            amount,
            kind: TransactionKind::from_amount(amount),
            normalized_amount: request.frequency.normalized_amount(amount),
        })
    }

    /// Evaluate a stored transaction
    pub async fn evaluate_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<EvaluationResult, EvaluationError> {
        self.evaluate(EvaluationRequest::from(transaction)).await
    }

    async fn compute(
        &self,
        expression: &str,
        owner_id: Option<&OwnerId>,
    ) -> Result<f64, EvaluationError> {
        let resolved = match owner_id {
            Some(owner_id) if expression.contains('$') => {
                self.resolver.resolve_references(expression, owner_id).await?
            }
            _ => expression.to_string(),
        };
        arithmetic::evaluate(&resolved)
    }
}
