//! Expression value type
//!
//! A transaction's amount is stored as an unevaluated formula such as
//! `"1200"`, `"-45.50 * 4"` or `"$<id> * 0.1"`. The value itself carries no
//! arithmetic meaning; evaluation happens in the services layer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Maximum accepted expression length, in characters
pub const MAX_EXPRESSION_LENGTH: usize = 1000;

/// Matches `$` followed by alphanumerics or hyphens; group 1 is the id
pub(crate) fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$([A-Za-z0-9-]+)").expect("invalid reference regex"))
}

/// Distinct referenced ids in `expression`, in order of first appearance
pub fn reference_ids(expression: &str) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for caps in reference_regex().captures_iter(expression) {
        if let Some(id) = caps.get(1).map(|m| m.as_str()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// An owned, trimmed formula string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Expression(String);

impl Expression {
    /// Create an expression, trimming whitespace
    ///
    /// Empty input becomes `"0"`.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ExpressionValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Ok(Self::zero());
        }

        let length = trimmed.chars().count();
        if length > MAX_EXPRESSION_LENGTH {
            return Err(ExpressionValidationError::TooLong(length));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The literal `"0"` expression
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    /// Get the formula text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the formula contains a reference token marker
    pub fn has_references(&self) -> bool {
        self.0.contains('$')
    }

    /// Distinct ids referenced by this formula
    pub fn references(&self) -> Vec<&str> {
        reference_ids(&self.0)
    }
}

impl Default for Expression {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Expression {
    type Err = ExpressionValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Expression {
    type Error = ExpressionValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Expression> for String {
    fn from(expression: Expression) -> Self {
        expression.0
    }
}

impl AsRef<str> for Expression {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validation errors for expressions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionValidationError {
    TooLong(usize),
}

impl fmt::Display for ExpressionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong(len) => write!(
                f,
                "Expression is too long ({} characters, max {})",
                len, MAX_EXPRESSION_LENGTH
            ),
        }
    }
}

impl std::error::Error for ExpressionValidationError {}
