//! Period aggregation.
//!
//! Sums employee records into [`PeriodTotals`] and assembles the immutable
//! [`PayrollPeriod`] payload that is handed to the payroll store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    EmployeePayrollRecord, ExcludedEmployee, PayrollPeriod, PeriodHeader, PeriodTotals,
    checked_sum,
};

/// Sums net pay, gross pay and fines across employee records.
///
/// `total_spent` and `total_net` are the exact sum of the records' net pay,
/// so an empty slice yields all zeros. Fails with `AmountOverflow` when a
/// sum exceeds the decimal range.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::aggregate;
/// use rust_decimal::Decimal;
///
/// let totals = aggregate(&[]).unwrap();
/// assert_eq!(totals.total_spent, Decimal::ZERO);
/// ```
pub fn aggregate(records: &[EmployeePayrollRecord]) -> EngineResult<PeriodTotals> {
    let total_net = checked_sum(records.iter().map(|r| r.net_pay), "period net pay")?;
    let total_gross = checked_sum(records.iter().map(|r| r.gross_pay), "period gross pay")?;
    let total_fines = checked_sum(records.iter().map(|r| r.fine_amount()), "period fines")?;

    Ok(PeriodTotals {
        total_spent: total_net,
        total_fines,
        total_gross,
        total_net,
    })
}

/// Merges records and totals with the period header into the final payload.
///
/// A fresh id is assigned on every call; retrying a failed write with the
/// same payload is the caller's concern.
pub fn assemble_period(
    header: PeriodHeader,
    records: Vec<EmployeePayrollRecord>,
    excluded: Vec<ExcludedEmployee>,
    created_at: DateTime<Utc>,
) -> EngineResult<PayrollPeriod> {
    let totals = aggregate(&records)?;

    Ok(PayrollPeriod {
        id: Uuid::new_v4(),
        period_start: header.period.start_date,
        period_end: header.period.end_date,
        pay_date: header.period.pay_date,
        fine_per_missed_hour: header.fine_per_missed_hour,
        work_hours: header.work_hours,
        ledger: header.ledger,
        employees: records,
        excluded,
        totals,
        created_at,
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Returns true if `totals` matches a fresh aggregation of `records`.
pub fn totals_match(records: &[EmployeePayrollRecord], totals: &PeriodTotals) -> bool {
    let Ok(fresh) = aggregate(records) else {
        return false;
    };
    fresh == *totals && totals.total_spent == totals.total_net && totals.total_net >= Decimal::ZERO
}
