//! The finalized payroll period payload and its reporting projection.
//!
//! A [`PayrollPeriod`] is what gets written to the payroll store on submit:
//! period bounds, fine settings, the ledger snapshot, every employee record
//! (with its attendance snapshot) and the period totals.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::LineItemLedger;

use super::{EmployeePayrollRecord, PayPeriod, WorkHours};

/// Period-wide sums over all employee records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// Total paid out; always equals `total_net`.
    pub total_spent: Decimal,
    /// Sum of every missed-hours fine.
    pub total_fines: Decimal,
    /// Sum of every gross pay.
    pub total_gross: Decimal,
    /// Sum of every net pay.
    pub total_net: Decimal,
}

/// An employee left out of the period and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedEmployee {
    /// The excluded employee.
    pub employee_id: String,
    /// Why the employee was excluded.
    pub reason: String,
}

/// Period-level inputs merged into the final payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodHeader {
    /// Period bounds and pay date.
    pub period: PayPeriod,
    /// Fine charged per missed hour.
    pub fine_per_missed_hour: Decimal,
    /// Company working hours reported by the attendance provider.
    pub work_hours: Option<WorkHours>,
    /// Snapshot of the general deductions and allowances.
    pub ledger: LineItemLedger,
}

/// An immutable record of one pay cycle's computed payroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollPeriod {
    /// Unique identifier for this payroll period.
    pub id: Uuid,
    /// First day covered (inclusive).
    pub period_start: NaiveDate,
    /// Last day covered (inclusive).
    pub period_end: NaiveDate,
    /// The date the payroll is paid out.
    pub pay_date: NaiveDate,
    /// Fine charged per missed hour.
    pub fine_per_missed_hour: Decimal,
    /// Company working hours, if reported.
    #[serde(default)]
    pub work_hours: Option<WorkHours>,
    /// General deductions and allowances as they stood at submission.
    pub ledger: LineItemLedger,
    /// Per-employee payment structures.
    pub employees: Vec<EmployeePayrollRecord>,
    /// Rostered employees left out of the period.
    #[serde(default)]
    pub excluded: Vec<ExcludedEmployee>,
    /// Period totals.
    pub totals: PeriodTotals,
    /// When the payload was assembled.
    pub created_at: DateTime<Utc>,
    /// The version of the engine that produced the payload.
    pub engine_version: String,
}

/// One employee's line in a period report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeReportLine {
    /// The employee.
    pub employee_id: String,
    /// Display name.
    pub name: String,
    /// Missed hours in the period.
    pub missed_hours: Decimal,
    /// Gross pay.
    pub gross_pay: Decimal,
    /// General plus employee allowances.
    pub total_allowances: Decimal,
    /// General plus employee deductions, fine included.
    pub total_deductions: Decimal,
    /// The missed-hours fine, or zero.
    pub fine: Decimal,
    /// Net pay.
    pub net_pay: Decimal,
}

/// Read-only projection of a finalized period for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodReport {
    /// The period the report describes.
    pub period_id: Uuid,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Pay date.
    pub pay_date: NaiveDate,
    /// Number of employees paid.
    pub employee_count: usize,
    /// Period totals.
    pub totals: PeriodTotals,
    /// One line per employee, in payload order.
    pub lines: Vec<EmployeeReportLine>,
}

impl PayrollPeriod {
    /// The period bounds as a [`PayPeriod`].
    pub fn pay_period(&self) -> PayPeriod {
        PayPeriod {
            start_date: self.period_start,
            end_date: self.period_end,
            pay_date: self.pay_date,
        }
    }

    /// Looks up an employee record by id.
    pub fn employee(&self, employee_id: &str) -> Option<&EmployeePayrollRecord> {
        self.employees.iter().find(|r| r.employee_id == employee_id)
    }

    /// Projects the period into a report.
    pub fn report(&self) -> PeriodReport {
        let lines = self
            .employees
            .iter()
            .map(|record| EmployeeReportLine {
                employee_id: record.employee_id.clone(),
                name: record.name().to_string(),
                missed_hours: record.attendance.total_missed_hours,
                gross_pay: record.gross_pay,
                total_allowances: record.total_allowances,
                total_deductions: record.total_deductions,
                fine: record.fine_amount(),
                net_pay: record.net_pay,
            })
            .collect();

        PeriodReport {
            period_id: self.id,
            period_start: self.period_start,
            period_end: self.period_end,
            pay_date: self.pay_date,
            employee_count: self.employees.len(),
            totals: self.totals.clone(),
            lines,
        }
    }
}
