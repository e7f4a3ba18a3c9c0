//! Missed-hours fine calculation.
//!
//! The fine is an auto-generated deduction equal to the employee's missed
//! hours times the period's per-hour fine rate. A zero fine is represented by
//! the absence of the entry, never by a zero-amount entry.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceSummary, AuditStep, LineItem, MISSED_HOURS_FINE_LABEL, round_money};

/// The result of calculating a missed-hours fine, including the audit step.
#[derive(Debug, Clone)]
pub struct FineResult {
    /// The fine deduction, if one applies.
    pub line_item: Option<LineItem>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes `missed_hours x rate_per_hour`, rounded to 2 decimal places.
///
/// Returns zero when either input is zero or negative, and
/// `AmountOverflow` when the product exceeds the decimal range.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::compute_fine;
/// use rust_decimal::Decimal;
///
/// assert_eq!(compute_fine(Decimal::from(10), Decimal::from(5_000)).unwrap(), Decimal::from(50_000));
/// assert_eq!(compute_fine(Decimal::from(10), Decimal::ZERO).unwrap(), Decimal::ZERO);
/// assert_eq!(compute_fine(Decimal::new(-1, 0), Decimal::from(5_000)).unwrap(), Decimal::ZERO);
/// ```
pub fn compute_fine(missed_hours: Decimal, rate_per_hour: Decimal) -> EngineResult<Decimal> {
    if missed_hours <= Decimal::ZERO || rate_per_hour <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    missed_hours
        .checked_mul(rate_per_hour)
        .map(round_money)
        .ok_or_else(|| EngineError::overflow("missed hours fine"))
}

/// Derives the missed-hours fine line item for one employee.
///
/// # Arguments
///
/// * `attendance` - The employee's attendance summary
/// * `rate_per_hour` - The fine charged per missed hour (0 disables fines)
/// * `step_number` - The step number for audit trail sequencing
///
/// # Returns
///
/// A `FineResult` whose `line_item` is `Some` only when the fine is positive,
/// or `AmountOverflow` when the fine exceeds the decimal range.
pub fn calculate_missed_hours_fine(
    attendance: &AttendanceSummary,
    rate_per_hour: Decimal,
    step_number: u32,
) -> EngineResult<FineResult> {
    let missed_hours = attendance.total_missed_hours;
    let fine = compute_fine(missed_hours, rate_per_hour)?;

    let input = serde_json::json!({
        "missed_hours": missed_hours.normalize().to_string(),
        "rate_per_hour": rate_per_hour.normalize().to_string()
    });

    if fine.is_zero() {
        let reasoning = if rate_per_hour <= Decimal::ZERO {
            "No fine - missed hours fines are disabled".to_string()
        } else {
            format!("No fine - {}h missed", missed_hours.normalize())
        };

        return Ok(FineResult {
            line_item: None,
            audit_step: AuditStep {
                step_number,
                rule_id: "missed_hours_fine".to_string(),
                rule_name: MISSED_HOURS_FINE_LABEL.to_string(),
                input,
                output: serde_json::json!({ "fine_applied": false }),
                reasoning,
            },
        });
    }

    Ok(FineResult {
        line_item: Some(LineItem::new(MISSED_HOURS_FINE_LABEL, fine)),
        audit_step: AuditStep {
            step_number,
            rule_id: "missed_hours_fine".to_string(),
            rule_name: MISSED_HOURS_FINE_LABEL.to_string(),
            input,
            output: serde_json::json!({
                "fine_applied": true,
                "fine": fine.normalize().to_string()
            }),
            reasoning: format!(
                "{}h x {} per hour = {}",
                missed_hours.normalize(),
                rate_per_hour.normalize(),
                fine.normalize()
            ),
        },
    })
}
