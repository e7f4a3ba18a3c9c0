//! Per-employee computed payroll record and its audit trace.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AttendanceSummary, LineItem};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The computed payroll for one employee.
///
/// Records are derived values. They are rebuilt from attendance, the period
/// ledger, the fine rate and the employee's own adjustments on every
/// recalculation and are never edited directly.
///
/// `employee_deductions` holds the missed-hours fine first (when one
/// applies) followed by the employee's own deductions in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeePayrollRecord {
    /// The employee this record is for.
    pub employee_id: String,
    /// Attendance snapshot the record was built from.
    pub attendance: AttendanceSummary,
    /// Employee-specific deductions, including the missed-hours fine.
    pub employee_deductions: Vec<LineItem>,
    /// Employee-specific allowances.
    pub employee_allowances: Vec<LineItem>,
    /// General plus employee allowances, rounded to 2 dp.
    pub total_allowances: Decimal,
    /// General plus employee deductions, rounded to 2 dp.
    pub total_deductions: Decimal,
    /// Base salary for the period, rounded to 2 dp.
    pub gross_pay: Decimal,
    /// Pay after adjustments, floored at zero and rounded to 2 dp.
    pub net_pay: Decimal,
    /// How the figures were derived.
    #[serde(default)]
    pub audit_trace: Vec<AuditStep>,
}

impl EmployeePayrollRecord {
    /// Returns the missed-hours fine entry, if one applies.
    pub fn missed_hours_fine(&self) -> Option<&LineItem> {
        self.employee_deductions
            .iter()
            .find(|item| item.is_missed_hours_fine())
    }

    /// Returns the missed-hours fine amount, or zero.
    pub fn fine_amount(&self) -> Decimal {
        self.missed_hours_fine()
            .map(|item| item.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// The employee's display name.
    pub fn name(&self) -> &str {
        &self.attendance.name
    }
}
