//! Attendance summary models supplied by the attendance provider.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One employee's aggregated attendance and base salary for a period.
///
/// Summaries are snapshots: once fetched for a period they are never edited,
/// and the same snapshot is frozen into the persisted payroll period.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AttendanceSummary;
/// use rust_decimal::Decimal;
///
/// let summary: AttendanceSummary = serde_json::from_str(r#"{
///     "employee_id": "emp_001",
///     "name": "Dewi",
///     "base_salary": "500000",
///     "total_expected_hours": "160",
///     "total_worked_hours": "150",
///     "total_missed_hours": "10",
///     "attendance_rate": "93.75"
/// }"#).unwrap();
///
/// assert_eq!(summary.total_missed_hours, Decimal::from(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// Unique identifier for the employee.
    pub employee_id: String,
    /// The employee's display name.
    pub name: String,
    /// Base salary for the period; becomes gross pay.
    pub base_salary: Decimal,
    /// Hours the employee was scheduled to work.
    #[serde(default)]
    pub total_expected_hours: Decimal,
    /// Hours actually worked.
    #[serde(default)]
    pub total_worked_hours: Decimal,
    /// Scheduled hours not worked; drives the missed-hours fine.
    #[serde(default)]
    pub total_missed_hours: Decimal,
    /// Worked hours as a percentage of expected hours.
    #[serde(default)]
    pub attendance_rate: Decimal,
}

/// Company-level working hours reported alongside attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHours {
    /// Start of the working day.
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    /// End of the working day.
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// Expected working hours per day.
    pub hours_per_day: Decimal,
}

/// A provider response for one period.
///
/// `roster` names every employee expected in the period. An employee on the
/// roster with no summary is excluded from the payroll. When the roster is
/// empty, the employees with summaries form the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceReport {
    /// Per-employee summaries.
    #[serde(default)]
    pub summaries: Vec<AttendanceSummary>,
    /// Expected employee ids, in display order.
    #[serde(default)]
    pub roster: Vec<String>,
    /// Company working-hour metadata, if the provider reports it.
    #[serde(default)]
    pub work_hours: Option<WorkHours>,
}

impl AttendanceReport {
    /// Creates a report from summaries alone.
    pub fn from_summaries(summaries: Vec<AttendanceSummary>) -> Self {
        Self {
            summaries,
            roster: Vec::new(),
            work_hours: None,
        }
    }

    /// Returns true if there is nothing to build payroll from.
    pub fn has_no_data(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Returns the summary for an employee, if one was reported.
    pub fn summary_for(&self, employee_id: &str) -> Option<&AttendanceSummary> {
        self.summaries.iter().find(|s| s.employee_id == employee_id)
    }

    /// Returns the effective roster.
    ///
    /// Explicit roster entries come first in their given order, followed by
    /// any summarised employee the roster omitted. Duplicates are dropped.
    pub fn effective_roster(&self) -> Vec<String> {
        let mut roster: Vec<String> = Vec::with_capacity(self.roster.len() + self.summaries.len());
        let ids = self
            .roster
            .iter()
            .chain(self.summaries.iter().map(|s| &s.employee_id));
        for id in ids {
            if !roster.contains(id) {
                roster.push(id.clone());
            }
        }
        roster
    }
}
