//! Effective-date handling
//!
//! Commission rules are effective over a calendar-date window. Both ends are
//! inclusive and the end may be left open.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },
}

/// A business-effective date range `[from, to]`
///
/// `to == None` means the period is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectivePeriod {
    /// First effective day (inclusive)
    pub from: NaiveDate,
    /// Last effective day (inclusive), None means unbounded
    pub to: Option<NaiveDate>,
}

impl EffectivePeriod {
    /// Creates a new period, rejecting `to < from`
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Result<Self, TemporalError> {
        if let Some(to) = to {
            if to < from {
                return Err(TemporalError::InvalidPeriod {
                    start: from.to_string(),
                    end: to.to_string(),
                });
            }
        }
        Ok(Self { from, to })
    }

    /// Creates an open-ended period starting on `from`
    pub fn starting(from: NaiveDate) -> Self {
        Self { from, to: None }
    }

    /// Creates a bounded period
    pub fn bounded(from: NaiveDate, to: NaiveDate) -> Result<Self, TemporalError> {
        Self::new(from, Some(to))
    }

    /// `from <= date <= to`, or `from <= date` when open-ended
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && self.to.map_or(true, |to| date <= to)
    }

    /// Returns true if the two periods share at least one day
    pub fn overlaps(&self, other: &EffectivePeriod) -> bool {
        let self_end = self.to.unwrap_or(NaiveDate::MAX);
        let other_end = other.to.unwrap_or(NaiveDate::MAX);

        self.from <= other_end && other.from <= self_end
    }

    /// Returns true if the period has no end date
    pub fn is_open_ended(&self) -> bool {
        self.to.is_none()
    }
}
