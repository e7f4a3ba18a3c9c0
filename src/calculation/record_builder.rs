//! Per-employee payroll record construction.
//!
//! Merges base salary, the missed-hours fine, the period ledger and the
//! employee's own adjustments into one [`EmployeePayrollRecord`].

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceSummary, AuditStep, EmployeePayrollRecord, LineItem, MISSED_HOURS_FINE_LABEL,
    checked_sum, non_negative, round_money,
};

use super::fine::calculate_missed_hours_fine;
use super::ledger::{EmployeeAdjustments, LineItemLedger};

/// Builds the payroll record for one employee.
///
/// Sums are taken over unrounded amounts; only `gross_pay`, `net_pay` and
/// the two totals are rounded to 2 decimal places in the output.
///
/// # Arguments
///
/// * `employee_id` - The employee to build for
/// * `attendance` - The employee's attendance summary, if the provider had one
/// * `ledger` - The period's general deductions and allowances
/// * `adjustments` - The employee's own deductions and allowances
/// * `fine_rate` - Fine per missed hour (0 disables fines)
///
/// # Errors
///
/// * `MissingAttendanceData` when `attendance` is `None`
/// * `ReservedLineItemName` when an employee deduction or allowance uses the
///   missed-hours fine label
/// * `AmountOverflow` when a sum or the fine exceeds the decimal range
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{build_record, EmployeeAdjustments, LineItemLedger};
/// use payroll_engine::models::AttendanceSummary;
/// use rust_decimal::Decimal;
///
/// let attendance = AttendanceSummary {
///     employee_id: "emp_001".to_string(),
///     name: "Dewi".to_string(),
///     base_salary: Decimal::from(500_000),
///     total_expected_hours: Decimal::from(160),
///     total_worked_hours: Decimal::from(150),
///     total_missed_hours: Decimal::from(10),
///     attendance_rate: Decimal::new(9375, 2),
/// };
///
/// let record = build_record(
///     "emp_001",
///     Some(&attendance),
///     &LineItemLedger::new(),
///     &EmployeeAdjustments::default(),
///     Decimal::from(5_000),
/// )
/// .unwrap();
///
/// assert_eq!(record.fine_amount(), Decimal::from(50_000));
/// assert_eq!(record.net_pay, Decimal::from(450_000));
/// ```
pub fn build_record(
    employee_id: &str,
    attendance: Option<&AttendanceSummary>,
    ledger: &LineItemLedger,
    adjustments: &EmployeeAdjustments,
    fine_rate: Decimal,
) -> EngineResult<EmployeePayrollRecord> {
    let attendance = attendance.ok_or_else(|| EngineError::MissingAttendanceData {
        employee_id: employee_id.to_string(),
    })?;
    check_reserved_names(employee_id, adjustments)?;

    let mut audit_trace: Vec<AuditStep> = Vec::with_capacity(5);

    let fine_result = calculate_missed_hours_fine(attendance, fine_rate, 1)?;
    audit_trace.push(fine_result.audit_step);

    let gross = attendance.base_salary;
    audit_trace.push(AuditStep {
        step_number: 2,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        input: serde_json::json!({
            "base_salary": gross.normalize().to_string()
        }),
        output: serde_json::json!({
            "gross_pay": round_money(gross).to_string()
        }),
        reasoning: "Gross pay is the base salary for the period".to_string(),
    });

    let general_allowances = ledger.general_allowances.total()?;
    let employee_allowances = adjustments.allowances.total()?;
    let total_allowances = checked_sum(
        [general_allowances, employee_allowances],
        "total allowances",
    )?;
    audit_trace.push(AuditStep {
        step_number: 3,
        rule_id: "allowances".to_string(),
        rule_name: "Allowances".to_string(),
        input: serde_json::json!({
            "general": general_allowances.normalize().to_string(),
            "employee": employee_allowances.normalize().to_string()
        }),
        output: serde_json::json!({
            "total_allowances": total_allowances.normalize().to_string()
        }),
        reasoning: format!(
            "{} general + {} employee = {}",
            general_allowances.normalize(),
            employee_allowances.normalize(),
            total_allowances.normalize()
        ),
    });

    let mut employee_deductions: Vec<LineItem> =
        Vec::with_capacity(adjustments.deductions.len() + 1);
    employee_deductions.extend(fine_result.line_item);
    employee_deductions.extend(adjustments.deductions.iter().cloned());

    let general_deductions = ledger.general_deductions.total()?;
    let own_deductions = checked_sum(
        employee_deductions.iter().map(|item| item.amount),
        "employee deductions",
    )?;
    let total_deductions = checked_sum(
        [general_deductions, own_deductions],
        "total deductions",
    )?;
    audit_trace.push(AuditStep {
        step_number: 4,
        rule_id: "deductions".to_string(),
        rule_name: "Deductions".to_string(),
        input: serde_json::json!({
            "general": general_deductions.normalize().to_string(),
            "employee": own_deductions.normalize().to_string()
        }),
        output: serde_json::json!({
            "total_deductions": total_deductions.normalize().to_string()
        }),
        reasoning: format!(
            "{} general + {} employee (incl. fine) = {}",
            general_deductions.normalize(),
            own_deductions.normalize(),
            total_deductions.normalize()
        ),
    });

    let raw_net = gross
        .checked_add(total_allowances)
        .and_then(|earned| earned.checked_sub(total_deductions))
        .ok_or_else(|| EngineError::overflow("net pay"))?;
    let net = non_negative(raw_net);
    let clamped = raw_net < Decimal::ZERO;
    audit_trace.push(AuditStep {
        step_number: 5,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "gross_pay": gross.normalize().to_string(),
            "total_allowances": total_allowances.normalize().to_string(),
            "total_deductions": total_deductions.normalize().to_string()
        }),
        output: serde_json::json!({
            "net_pay": round_money(net).to_string(),
            "clamped_to_zero": clamped
        }),
        reasoning: if clamped {
            format!(
                "{} + {} - {} is negative, net pay floored at 0",
                gross.normalize(),
                total_allowances.normalize(),
                total_deductions.normalize()
            )
        } else {
            format!(
                "{} + {} - {} = {}",
                gross.normalize(),
                total_allowances.normalize(),
                total_deductions.normalize(),
                net.normalize()
            )
        },
    });

    Ok(EmployeePayrollRecord {
        employee_id: employee_id.to_string(),
        attendance: attendance.clone(),
        employee_deductions,
        employee_allowances: adjustments.allowances.as_slice().to_vec(),
        total_allowances: round_money(total_allowances),
        total_deductions: round_money(total_deductions),
        gross_pay: round_money(gross),
        net_pay: round_money(net),
        audit_trace,
    })
}

/// Rejects employee items that would masquerade as the derived fine.
pub(crate) fn check_reserved_names(
    employee_id: &str,
    adjustments: &EmployeeAdjustments,
) -> EngineResult<()> {
    let reserved = adjustments
        .deductions
        .iter()
        .chain(adjustments.allowances.iter())
        .any(|item| item.name == MISSED_HOURS_FINE_LABEL);
    if reserved {
        return Err(EngineError::ReservedLineItemName {
            employee_id: employee_id.to_string(),
            name: MISSED_HOURS_FINE_LABEL.to_string(),
        });
    }
    Ok(())
}
