//! Category model
//!
//! Categories group transactions for reporting. Each category has a flow
//! (income, expense, or savings & investments) that the percentage report
//! aggregates by.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::CategoryId;

/// Maximum category name length
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// Direction of money for a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryFlow {
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "expense")]
    Expense,
    #[serde(rename = "s&i")]
    SavingsAndInvestments,
}

impl CategoryFlow {
    /// Get all flows in display order
    pub fn all() -> &'static [Self] {
        &[Self::Income, Self::Expense, Self::SavingsAndInvestments]
    }

    /// The serialized token
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::SavingsAndInvestments => "s&i",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
            Self::SavingsAndInvestments => "Savings & Investments",
        }
    }
}

impl fmt::Display for CategoryFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CategoryFlow {
    type Err = CategoryValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "s&i" | "savings" | "investments" => Ok(Self::SavingsAndInvestments),
            other => Err(CategoryValidationError::InvalidFlow(other.to_string())),
        }
    }
}

/// A reporting category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,

    /// Category name (unique, case-insensitive)
    pub name: String,

    /// Income, expense or savings & investments
    pub flow: CategoryFlow,

    /// Display color as `#RRGGBB`
    pub color: Option<String>,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// When the category was created
    pub created_at: DateTime<Utc>,

    /// When the category was last modified
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category
    pub fn new(name: impl Into<String>, flow: CategoryFlow) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            flow,
            color: None,
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new category with a color
    pub fn with_color(name: impl Into<String>, flow: CategoryFlow, color: &str) -> Self {
        let mut category = Self::new(name, flow);
        category.color = Some(color.to_string());
        category
    }

    /// Case-insensitive name comparison
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        let len = name.chars().count();
        if len > MAX_CATEGORY_NAME_LENGTH {
            return Err(CategoryValidationError::NameTooLong(len));
        }

        if let Some(color) = &self.color {
            if !is_hex_color(color) {
                return Err(CategoryValidationError::InvalidColor(color.clone()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .map(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Categories seeded on first run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultCategory {
    Salary,
    Freelance,
    Investments,
    Groceries,
    Utilities,
    Transportation,
    Entertainment,
    Healthcare,
    Savings,
    EmergencyFund,
    Retirement,
}

impl DefaultCategory {
    /// Get all defaults in seed order
    pub fn all() -> &'static [Self] {
        &[
            Self::Salary,
            Self::Freelance,
            Self::Investments,
            Self::Groceries,
            Self::Utilities,
            Self::Transportation,
            Self::Entertainment,
            Self::Healthcare,
            Self::Savings,
            Self::EmergencyFund,
            Self::Retirement,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Salary => "Salary",
            Self::Freelance => "Freelance",
            Self::Investments => "Investments",
            Self::Groceries => "Groceries",
            Self::Utilities => "Utilities",
            Self::Transportation => "Transportation",
            Self::Entertainment => "Entertainment",
            Self::Healthcare => "Healthcare",
            Self::Savings => "Savings",
            Self::EmergencyFund => "Emergency Fund",
            Self::Retirement => "Retirement",
        }
    }

    pub fn flow(&self) -> CategoryFlow {
        match self {
            Self::Salary | Self::Freelance | Self::Investments => CategoryFlow::Income,
            Self::Groceries
            | Self::Utilities
            | Self::Transportation
            | Self::Entertainment
            | Self::Healthcare => CategoryFlow::Expense,
            Self::Savings | Self::EmergencyFund | Self::Retirement => {
                CategoryFlow::SavingsAndInvestments
            }
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Salary => "#10B981",
            Self::Freelance => "#3B82F6",
            Self::Investments => "#8B5CF6",
            Self::Groceries => "#EF4444",
            Self::Utilities => "#F59E0B",
            Self::Transportation => "#06B6D4",
            Self::Entertainment => "#EC4899",
            Self::Healthcare => "#84CC16",
            Self::Savings => "#6366F1",
            Self::EmergencyFund => "#059669",
            Self::Retirement => "#DC2626",
        }
    }

    /// Create a Category from this default
    pub fn to_category(&self) -> Category {
        Category::with_color(self.name(), self.flow(), self.color())
    }
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
    InvalidColor(String),
    InvalidFlow(String),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => write!(
                f,
                "Category name too long ({} chars, max {})",
                len, MAX_CATEGORY_NAME_LENGTH
            ),
            Self::InvalidColor(color) => {
                write!(f, "Invalid color '{}': expected #RRGGBB", color)
            }
            Self::InvalidFlow(flow) => write!(
                f,
                "Invalid category flow '{}': expected income, expense or s&i",
                flow
            ),
        }
    }
}

impl std::error::Error for CategoryValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_category() {
        let category = Category::new("Rent", CategoryFlow::Expense);
        assert_eq!(category.name, "Rent");
        assert_eq!(category.flow, CategoryFlow::Expense);
        assert!(category.color.is_none());
        assert!(category.validate().is_ok());
    }

    #[test]
    fn test_category_validation() {
        let mut category = Category::new("Valid", CategoryFlow::Income);

        category.name = String::new();
        assert_eq!(
            category.validate(),
            Err(CategoryValidationError::EmptyName)
        );

        category.name = "a".repeat(MAX_CATEGORY_NAME_LENGTH + 1);
        assert!(matches!(
            category.validate(),
            Err(CategoryValidationError::NameTooLong(_))
        ));

        category.name = "Valid".into();
        category.color = Some("red".into());
        assert!(matches!(
            category.validate(),
            Err(CategoryValidationError::InvalidColor(_))
        ));

        category.color = Some("#a1B2c3".into());
        assert!(category.validate().is_ok());
    }

    #[test]
    fn test_has_name_is_case_insensitive() {
        let category = Category::new("Groceries", CategoryFlow::Expense);
        assert!(category.has_name("groceries"));
        assert!(category.has_name(" GROCERIES "));
        assert!(!category.has_name("Grocery"));
    }

    #[test]
    fn test_flow_parsing() {
        assert_eq!("income".parse::<CategoryFlow>(), Ok(CategoryFlow::Income));
        assert_eq!(
            "S&I".parse::<CategoryFlow>(),
            Ok(CategoryFlow::SavingsAndInvestments)
        );
        assert!("transfer".parse::<CategoryFlow>().is_err());
    }

    #[test]
    fn test_flow_serialization() {
        let json = serde_json::to_string(&CategoryFlow::SavingsAndInvestments).unwrap();
        assert_eq!(json, "\"s&i\"");
        let flow: CategoryFlow = serde_json::from_str("\"expense\"").unwrap();
        assert_eq!(flow, CategoryFlow::Expense);
    }

    #[test]
    fn test_default_categories() {
        let defaults = DefaultCategory::all();
        assert_eq!(defaults.len(), 11);
        assert_eq!(defaults[0].name(), "Salary");
        assert_eq!(DefaultCategory::EmergencyFund.name(), "Emergency Fund");

        let incomes = defaults
            .iter()
            .filter(|d| d.flow() == CategoryFlow::Income)
            .count();
        assert_eq!(incomes, 3);

        for default in defaults {
            assert!(default.to_category().validate().is_ok());
        }
    }

    #[test]
    fn test_serialization() {
        let category = DefaultCategory::Savings.to_category();
        let json = serde_json::to_string(&category).unwrap();
        assert!(json.contains("\"flow\":\"s&i\""));

        let deserialized: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(category.id, deserialized.id);
        assert_eq!(deserialized.color.as_deref(), Some("#6366F1"));
    }
}
