//! Tally - budgeting with formula-defined recurring transactions
//!
//! A transaction's amount is an arithmetic expression that may reference
//! other transactions of the same owner with `$<id>`. Evaluating one resolves
//! those references recursively, computes the amount, classifies it as income
//! or expense, and normalizes it to a monthly figure by its frequency.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (transactions, expressions, frequencies, categories)
//! - `storage`: JSON file storage layer
//! - `services`: Evaluation pipeline and business logic
//! - `reports`: Monthly summary and percentage breakdowns
//! - `display`: Terminal formatting
//! - `export`: CSV, JSON and YAML exports
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::services::TransactionEvaluator;
//!
//! let evaluator = TransactionEvaluator::new(&storage.transactions);
//! let result = evaluator.evaluate_transaction(&transaction).await?;
//! println!("{} per month", result.normalized_amount);
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{EvaluationError, TallyError};
