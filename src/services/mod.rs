//! Service layer for Tally
//!
//! The evaluation pipeline (arithmetic, reference resolution, transaction
//! evaluation) and recurrence projection, plus the services that combine them
//! with the storage layer.

pub mod arithmetic;
pub mod category;
pub mod evaluator;
pub mod recurrence;
pub mod resolver;
pub mod transaction;

pub use category::CategoryService;
pub use evaluator::{EvaluationRequest, TransactionEvaluator};
pub use recurrence::{due_within, DueTransaction, RecurrencePattern};
pub use resolver::{ReferenceResolver, TransactionLookup};
pub use transaction::{
    CreateTransactionInput, EvaluatedTransaction, TransactionFilter, TransactionService,
    UpdateTransactionInput,
};
