//! Transaction model
//!
//! A transaction's amount is a formula (`Expression`) that may reference other
//! transactions by `$<id>`, tagged with the `Frequency` it recurs at. The date
//! is the first occurrence.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::expression::Expression;
use super::frequency::Frequency;
use super::ids::{CategoryId, OwnerId, TransactionId};

/// Maximum description length
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// Maximum notes length
pub const MAX_NOTES_LENGTH: usize = 1000;

/// A formula-defined transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// The owner whose transactions this one may reference
    pub owner_id: OwnerId,

    /// Short description ("Rent", "Salary")
    pub description: String,

    /// Amount formula
    #[serde(default)]
    pub expression: Expression,

    /// Recurrence frequency
    #[serde(default)]
    pub frequency: Frequency,

    /// Date of the first occurrence
    pub date: NaiveDate,

    /// Category ID (optional)
    pub category_id: Option<CategoryId>,

    /// Notes
    #[serde(default)]
    pub notes: String,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,

    /// When the transaction was last modified
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        owner_id: OwnerId,
        description: impl Into<String>,
        expression: Expression,
        frequency: Frequency,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            owner_id,
            description: description.into(),
            expression,
            frequency,
            date,
            category_id: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The token other expressions use to reference this transaction
    pub fn reference_token(&self) -> String {
        format!("${}", self.id.as_uuid())
    }

    /// Check if this transaction belongs to `owner_id`
    pub fn belongs_to(&self, owner_id: &OwnerId) -> bool {
        self.owner_id == *owner_id
    }

    /// Check if the expression references `id`
    ///
    /// Tokens may use the bare uuid or the `txn-` prefixed form.
    pub fn references(&self, id: TransactionId) -> bool {
        self.expression
            .references()
            .into_iter()
            .any(|token| token.parse::<TransactionId>().ok() == Some(id))
    }

    /// Check if the expression references this transaction itself
    pub fn references_itself(&self) -> bool {
        self.references(self.id)
    }

    /// Replace the expression
    pub fn set_expression(&mut self, expression: Expression) {
        self.expression = expression;
        self.updated_at = Utc::now();
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(TransactionValidationError::EmptyDescription);
        }

        let len = description.chars().count();
        if len > MAX_DESCRIPTION_LENGTH {
            return Err(TransactionValidationError::DescriptionTooLong(len));
        }

        let notes_len = self.notes.chars().count();
        if notes_len > MAX_NOTES_LENGTH {
            return Err(TransactionValidationError::NotesTooLong(notes_len));
        }

        if self.references_itself() {
            return Err(TransactionValidationError::SelfReference);
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] every {}",
            self.date.format("%Y-%m-%d"),
            self.description,
            self.expression,
            self.frequency.display_label()
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    EmptyDescription,
    DescriptionTooLong(usize),
    NotesTooLong(usize),
    SelfReference,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "Transaction description cannot be empty"),
            Self::DescriptionTooLong(len) => write!(
                f,
                "Transaction description too long ({} characters, max {})",
                len, MAX_DESCRIPTION_LENGTH
            ),
            Self::NotesTooLong(len) => write!(
                f,
                "Transaction notes too long ({} characters, max {})",
                len, MAX_NOTES_LENGTH
            ),
            Self::SelfReference => write!(f, "Transaction expression references itself"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}
