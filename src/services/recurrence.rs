//! Recurrence handling
//!
//! Computes occurrence dates for a frequency between a start date and an
//! optional end date or occurrence limit. This is the calendar side of
//! recurring transactions only; nothing here posts or schedules anything.

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::models::{Frequency, Transaction};

/// Problems with a recurrence pattern
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("Start date {start} is in the past (today is {today})")]
    StartInPast { start: NaiveDate, today: NaiveDate },

    #[error("End date {end} must be after start date {start}")]
    EndNotAfterStart { start: NaiveDate, end: NaiveDate },

    #[error("Maximum occurrences must be greater than zero")]
    ZeroMaxOccurrences,

    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),
}

/// How often something recurs, and for how long
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_occurrences: Option<u32>,
    pub custom_cron: Option<String>,
}

/// The occurrence following a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextOccurrence {
    pub date: NaiveDate,

    /// 1-based
    pub occurrence_number: u32,
    pub is_last: bool,
}

impl RecurrencePattern {
    pub fn new(frequency: Frequency, start_date: NaiveDate) -> Self {
        Self {
            frequency,
            start_date,
            end_date: None,
            max_occurrences: None,
            custom_cron: None,
        }
    }

    /// The open-ended pattern of a stored transaction
    pub fn for_transaction(transaction: &Transaction) -> Self {
        Self::new(transaction.frequency, transaction.date)
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_max_occurrences(mut self, max_occurrences: u32) -> Self {
        self.max_occurrences = Some(max_occurrences);
        self
    }

    pub fn with_custom_cron(mut self, cron: impl Into<String>) -> Self {
        self.custom_cron = Some(cron.into());
        self
    }

    /// Validate a pattern for a new schedule starting no earlier than `today`
    pub fn validate_at(&self, today: NaiveDate) -> Result<(), RecurrenceError> {
        if self.start_date < today {
            return Err(RecurrenceError::StartInPast {
                start: self.start_date,
                today,
            });
        }
        self.validate_bounds()
    }

    /// Validate a pattern for a new schedule starting today or later
    pub fn validate(&self) -> Result<(), RecurrenceError> {
        self.validate_at(Local::now().date_naive())
    }

    /// Validate everything except the start date
    ///
    /// Used when projecting existing transactions, whose start dates are
    /// usually in the past.
    pub fn validate_bounds(&self) -> Result<(), RecurrenceError> {
        if let Some(end) = self.end_date {
            if end <= self.start_date {
                return Err(RecurrenceError::EndNotAfterStart {
                    start: self.start_date,
                    end,
                });
            }
        }

        if self.max_occurrences == Some(0) {
            return Err(RecurrenceError::ZeroMaxOccurrences);
        }

        if let Some(cron) = &self.custom_cron {
            if !validate_cron_expression(cron) {
                return Err(RecurrenceError::InvalidCron(cron.clone()));
            }
        }

        Ok(())
    }

    /// Advance one period, or `None` once the calendar runs out
    fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        let next = self.frequency.next_occurrence(date);
        (next > date).then_some(next)
    }

    fn limit_reached(&self, count: u32) -> bool {
        self.max_occurrences.is_some_and(|max| count >= max)
    }

    /// Number of occurrences on or before `up_to`
    pub fn occurrence_count(&self, up_to: NaiveDate) -> u32 {
        if up_to < self.start_date {
            return 0;
        }
        let up_to = match self.end_date {
            Some(end) if up_to > end => end,
            _ => up_to,
        };

        let mut count = 0;
        let mut current = Some(self.start_date);
        while let Some(date) = current.filter(|d| *d <= up_to) {
            count += 1;
            if self.limit_reached(count) {
                break;
            }
            current = self.advance(date);
        }
        count
    }

    /// The occurrence after the one at `current`
    ///
    /// Before any occurrence has happened, this is the start date. Returns
    /// `None` once the end date or occurrence limit has been reached.
    pub fn next_after(&self, current: NaiveDate) -> Option<NextOccurrence> {
        let count = self.occurrence_count(current);
        if self.limit_reached(count) {
            return None;
        }
        if self.end_date.is_some_and(|end| current >= end) {
            return None;
        }

        let occurrence_number = count + 1;
        let date = if occurrence_number == 1 {
            self.start_date
        } else {
            self.advance(current)?
        };

        if self.end_date.is_some_and(|end| date > end) {
            return None;
        }

        let is_last = self.limit_reached(occurrence_number)
            || self.end_date.is_some_and(|end| {
                self.advance(date).map_or(true, |following| following > end)
            });

        Some(NextOccurrence {
            date,
            occurrence_number,
            is_last,
        })
    }

    /// Up to `limit` occurrence dates, starting with the start date
    pub fn future_occurrences(&self, limit: usize) -> Vec<NaiveDate> {
        self.occurrences_from(self.start_date)
            .take(limit)
            .map(|(date, _)| date)
            .collect()
    }

    /// The first occurrence on or after `date`, with its 1-based number
    pub fn first_on_or_after(&self, date: NaiveDate) -> Option<(NaiveDate, u32)> {
        self.occurrences_from(self.start_date)
            .find(|(occurrence, _)| *occurrence >= date)
    }

    /// `amount` times the number of occurrences up to `end_date`
    pub fn total_amount(&self, amount: f64, end_date: NaiveDate) -> f64 {
        amount * f64::from(self.occurrence_count(end_date))
    }

    fn occurrences_from(&self, start: NaiveDate) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        let mut current = Some(start);
        let mut number = 0u32;
        std::iter::from_fn(move || {
            let date = current?;
            if self.limit_reached(number) || self.end_date.is_some_and(|end| date > end) {
                return None;
            }
            number += 1;
            current = self.advance(date);
            Some((date, number))
        })
    }
}

/// Check a five-field cron expression (`minute hour day month weekday`)
///
/// Each field may be `*`, a number, a range `a-b`, a step `*/n` or a
/// comma-separated list of numbers and ranges.
pub fn validate_cron_expression(expression: &str) -> bool {
    const BOUNDS: [(u32, u32); 5] = [(0, 59), (0, 23), (1, 31), (1, 12), (0, 6)];

    let fields: Vec<&str> = expression.split(' ').collect();
    fields.len() == BOUNDS.len()
        && fields
            .iter()
            .zip(BOUNDS)
            .all(|(field, (min, max))| is_valid_cron_field(field, min, max))
}

fn is_valid_cron_field(field: &str, min: u32, max: u32) -> bool {
    if field == "*" {
        return true;
    }

    if let Some(step) = field.strip_prefix("*/") {
        return step.parse::<u32>().is_ok_and(|n| n > 0 && n <= max);
    }

    field.split(',').all(|part| match part.split_once('-') {
        Some((start, end)) => match (start.parse::<u32>(), end.parse::<u32>()) {
            (Ok(start), Ok(end)) => start >= min && end <= max && start <= end,
            _ => false,
        },
        None => part.parse::<u32>().is_ok_and(|n| n >= min && n <= max),
    })
}

/// A stored transaction with an occurrence falling inside a window
#[derive(Debug, Clone)]
pub struct DueTransaction<'t> {
    pub transaction: &'t Transaction,
    pub due_date: NaiveDate,
    pub occurrence_number: u32,
    pub days_until_due: i64,
}

/// Transactions with an occurrence between `today` and `today + days`
///
/// Sorted by due date, then description.
pub fn due_within(
    transactions: &[Transaction],
    today: NaiveDate,
    days: u32,
) -> Vec<DueTransaction<'_>> {
    let horizon = today
        .checked_add_days(chrono::Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);

    let mut due: Vec<DueTransaction<'_>> = transactions
        .iter()
        .filter_map(|transaction| {
            let (due_date, occurrence_number) =
                RecurrencePattern::for_transaction(transaction).first_on_or_after(today)?;
            (due_date <= horizon).then(|| DueTransaction {
                transaction,
                due_date,
                occurrence_number,
                days_until_due: (due_date - today).num_days(),
            })
        })
        .collect();

    due.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.transaction.description.cmp(&b.transaction.description))
    });
    due
}
