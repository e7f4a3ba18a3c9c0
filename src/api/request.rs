//! Request types for the payroll API.
//!
//! This module defines the JSON request body shared by `/payroll/preview`
//! and `/payroll/periods`. Money travels as decimal strings.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::{EmployeeAdjustments, LineItemLedger};
use crate::models::{AttendanceReport, PayPeriod};

/// Request body for composing a payroll period.
///
/// Fields left out fall back to the configured defaults: the fine rate and
/// the general ledger templates from `payroll.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRequest {
    /// The period being paid.
    pub period: PayPeriodRequest,
    /// Attendance for the period, as the attendance service reported it.
    pub attendance: AttendanceReport,
    /// Fine charged per missed hour; the configured default when absent.
    #[serde(default)]
    pub fine_per_missed_hour: Option<Decimal>,
    /// General deductions and allowances; the configured templates when absent.
    #[serde(default)]
    pub ledger: Option<LineItemLedger>,
    /// Per-employee deductions and allowances, keyed by employee id.
    #[serde(default)]
    pub employee_adjustments: BTreeMap<String, EmployeeAdjustments>,
}

/// Pay period information in a payroll request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPeriodRequest {
    /// The start date of the pay period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub end_date: NaiveDate,
    /// The date the payroll is paid out.
    pub pay_date: NaiveDate,
}

impl From<PayPeriodRequest> for PayPeriod {
    fn from(req: PayPeriodRequest) -> Self {
        PayPeriod {
            start_date: req.start_date,
            end_date: req.end_date,
            pay_date: req.pay_date,
        }
    }
}
