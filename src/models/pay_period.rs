//! Pay period bounds.
//!
//! This module contains the [`PayPeriod`] type that defines which dates a
//! payroll covers and when it is paid.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The date range a payroll covers and its pay date.
///
/// A valid period has `start_date <= end_date <= pay_date`.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayPeriod;
/// use chrono::NaiveDate;
///
/// let period = PayPeriod {
///     start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
///     pay_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
/// };
///
/// assert!(period.validate().is_ok());
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// The start date of the pay period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub end_date: NaiveDate,
    /// The date the payroll is paid out.
    pub pay_date: NaiveDate,
}

impl PayPeriod {
    /// Checks the period bounds.
    ///
    /// Fails with [`EngineError::InvalidPeriod`] when the end precedes the
    /// start, or the pay date precedes the end.
    pub fn validate(&self) -> EngineResult<()> {
        if self.end_date < self.start_date {
            return Err(EngineError::InvalidPeriod {
                message: format!(
                    "period end {} is before period start {}",
                    self.end_date, self.start_date
                ),
            });
        }
        if self.pay_date < self.end_date {
            return Err(EngineError::InvalidPeriod {
                message: format!(
                    "pay date {} is before period end {}",
                    self.pay_date, self.end_date
                ),
            });
        }
        Ok(())
    }

    /// Checks if a given date falls within this pay period, inclusive.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Number of calendar days covered, inclusive of both ends.
    pub fn length_in_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}
