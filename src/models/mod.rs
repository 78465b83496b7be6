//! Core data models for Tally
//!
//! This module contains the data structures of the expression-budgeting
//! domain: transactions with formula amounts, frequencies, categories and
//! evaluation results.

pub mod category;
pub mod evaluation;
pub mod expression;
pub mod frequency;
pub mod ids;
pub mod transaction;

pub use category::{Category, CategoryFlow, DefaultCategory};
pub use evaluation::{EvaluationResult, TransactionKind};
pub use expression::Expression;
pub use frequency::Frequency;
pub use ids::{CategoryId, OwnerId, TransactionId};
pub use transaction::Transaction;
