//! Recurrence frequency of a transaction
//!
//! Each frequency knows how to rescale an amount to its monthly equivalent and
//! how to advance a calendar date to the next occurrence. All per-frequency data
//! lives in a single rule table indexed by the enum, so normalization, labels
//! and cron expressions never drift apart.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EvaluationError;

/// How often a transaction recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Frequency {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "fortnight")]
    Fortnight,
    #[default]
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "2-month")]
    TwoMonth,
    #[serde(rename = "3-month")]
    ThreeMonth,
    #[serde(rename = "quarter")]
    Quarter,
    #[serde(rename = "half")]
    Half,
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "2-year")]
    TwoYear,
}

/// Ratio between a periodic amount and its monthly equivalent
#[derive(Debug, Clone, Copy, PartialEq)]
enum MonthlyFactor {
    Times(f64),
    Per(f64),
}

/// Calendar step between two occurrences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advance {
    Days(u64),
    Months(u32),
}

struct FrequencyRule {
    frequency: Frequency,
    token: &'static str,
    label: &'static str,
    factor: MonthlyFactor,
    advance: Advance,
    cron: &'static str,
}

// Order must follow the enum declaration.
static RULES: [FrequencyRule; 10] = [
    FrequencyRule {
        frequency: Frequency::Daily,
        token: "daily",
        label: "Daily",
        factor: MonthlyFactor::Times(30.0),
        advance: Advance::Days(1),
        cron: "0 0 * * *",
    },
    FrequencyRule {
        frequency: Frequency::Week,
        token: "week",
        label: "Week",
        factor: MonthlyFactor::Times(4.33),
        advance: Advance::Days(7),
        cron: "0 0 * * 1",
    },
    FrequencyRule {
        frequency: Frequency::Fortnight,
        token: "fortnight",
        label: "Fortnight",
        factor: MonthlyFactor::Times(2.17),
        advance: Advance::Days(14),
        cron: "0 0 1,15 * *",
    },
    FrequencyRule {
        frequency: Frequency::Month,
        token: "month",
        label: "Month",
        factor: MonthlyFactor::Times(1.0),
        advance: Advance::Months(1),
        cron: "0 0 1 * *",
    },
    FrequencyRule {
        frequency: Frequency::TwoMonth,
        token: "2-month",
        label: "2-Month",
        factor: MonthlyFactor::Per(2.0),
        advance: Advance::Months(2),
        cron: "0 0 1 */2 *",
    },
    FrequencyRule {
        frequency: Frequency::ThreeMonth,
        token: "3-month",
        label: "3-Month",
        factor: MonthlyFactor::Per(3.0),
        advance: Advance::Months(3),
        cron: "0 0 1 */3 *",
    },
    FrequencyRule {
        frequency: Frequency::Quarter,
        token: "quarter",
        label: "Quarter",
        factor: MonthlyFactor::Per(3.0),
        advance: Advance::Months(3),
        cron: "0 0 1 */3 *",
    },
    FrequencyRule {
        frequency: Frequency::Half,
        token: "half",
        label: "Half",
        factor: MonthlyFactor::Per(6.0),
        advance: Advance::Months(6),
        cron: "0 0 1 */6 *",
    },
    FrequencyRule {
        frequency: Frequency::Year,
        token: "year",
        label: "Year",
        factor: MonthlyFactor::Per(12.0),
        advance: Advance::Months(12),
        cron: "0 0 1 1 *",
    },
    FrequencyRule {
        frequency: Frequency::TwoYear,
        token: "2-year",
        label: "2-Year",
        factor: MonthlyFactor::Per(24.0),
        advance: Advance::Months(24),
        cron: "0 0 1 1 */2",
    },
];

impl Frequency {
    /// All frequencies, shortest period first
    pub fn all() -> [Frequency; 10] {
        [
            Self::Daily,
            Self::Week,
            Self::Fortnight,
            Self::Month,
            Self::TwoMonth,
            Self::ThreeMonth,
            Self::Quarter,
            Self::Half,
            Self::Year,
            Self::TwoYear,
        ]
    }

    fn rule(&self) -> &'static FrequencyRule {
        &RULES[*self as usize]
    }

    /// Parse a frequency token such as `"week"` or `"2-month"`
    pub fn parse(value: &str) -> Result<Self, EvaluationError> {
        RULES
            .iter()
            .find(|rule| rule.token == value)
            .map(|rule| rule.frequency)
            .ok_or_else(|| EvaluationError::InvalidFrequency(value.to_string()))
    }

    /// The stored token (`"2-month"`)
    pub fn as_str(&self) -> &'static str {
        self.rule().token
    }

    /// Human readable label (`"2-Month"`)
    pub fn display_label(&self) -> &'static str {
        self.rule().label
    }

    /// Cron schedule matching this frequency
    pub fn cron_expression(&self) -> &'static str {
        self.rule().cron
    }

    /// Multiplier that turns one period's amount into a monthly amount
    pub fn monthly_factor(&self) -> f64 {
        match self.rule().factor {
            MonthlyFactor::Times(factor) => factor,
            MonthlyFactor::Per(periods) => 1.0 / periods,
        }
    }

    /// Convert a periodic amount into its monthly equivalent
    ///
    /// The factors are approximations (a month is 30 days or 4.33 weeks).
    /// The sign of `amount` is preserved.
    pub fn normalized_amount(&self, amount: f64) -> f64 {
        match self.rule().factor {
            MonthlyFactor::Times(factor) => amount * factor,
            MonthlyFactor::Per(periods) => amount / periods,
        }
    }

    /// Monthly equivalent formatted as `"<x.xx> per month"`
    pub fn normalized_amount_display(&self, amount: f64) -> String {
        if amount.is_nan() {
            return "0.00 per month".to_string();
        }
        format!("{:.2} per month", self.normalized_amount(amount))
    }

    /// The date of the occurrence following `date`
    ///
    /// Month-based frequencies add calendar months and clamp to the last day of
    /// the target month (Jan 31 + 1 month is Feb 28/29). Dates past the
    /// supported calendar range saturate at `NaiveDate::MAX`.
    pub fn next_occurrence(&self, date: NaiveDate) -> NaiveDate {
        let next = match self.rule().advance {
            Advance::Days(days) => date.checked_add_days(Days::new(days)),
            Advance::Months(months) => date.checked_add_months(Months::new(months)),
        };
        next.unwrap_or(NaiveDate::MAX)
    }

    /// `(token, label)` pairs for presentation
    pub fn labels() -> Vec<(&'static str, &'static str)> {
        RULES.iter().map(|rule| (rule.token, rule.label)).collect()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
