//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod line_item;
mod money;
mod pay_period;
mod payroll_period;
mod payroll_record;

pub use attendance::{AttendanceReport, AttendanceSummary, WorkHours};
pub use line_item::{LineItem, LineItemKind, MISSED_HOURS_FINE_LABEL};
pub use money::{
    MONEY_DECIMAL_PLACES, checked_sum, coerce_amount, format_amount, non_negative, round_money,
};
pub use pay_period::PayPeriod;
pub use payroll_period::{
    EmployeeReportLine, ExcludedEmployee, PayrollPeriod, PeriodHeader, PeriodReport, PeriodTotals,
};
pub use payroll_record::{AuditStep, EmployeePayrollRecord};
