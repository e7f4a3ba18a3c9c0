//! The recalculation engine.
//!
//! [`RecalculationEngine`] owns one payroll period while it is being
//! composed. Every input change (fine rate, general ledger item, employee
//! item) funnels through [`RecalculationEngine::recalculate`], which
//! re-derives every employee record and the period totals before the
//! mutating call returns. Callers therefore never observe stale records.
//!
//! ```text
//!   Empty ──fetch──▶ Loaded ──edit──▶ Dirty ──recalculate──▶ Consistent ──submit──▶ Finalized
//!                      │                 ▲                        ▲  │
//!                      │                 └──────── edit ──────────┼──┘
//!                      └────────────── recalculate ───────────────┘
//! ```
//!
//! Fetching attendance is split into [`begin_fetch`](RecalculationEngine::begin_fetch)
//! and [`complete_fetch`](RecalculationEngine::complete_fetch) so that a
//! response for a superseded request is recognised and dropped.

mod provider;
mod store;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculation::{
    EmployeeAdjustments, LineItemLedger, LineItems, assemble_period, aggregate, build_record,
    check_reserved_names,
};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceReport, AttendanceSummary, EmployeePayrollRecord, ExcludedEmployee, LineItem,
    LineItemKind, MISSED_HOURS_FINE_LABEL, PayPeriod, PayrollPeriod, PeriodHeader, PeriodTotals,
    WorkHours, non_negative,
};

pub use provider::{AttendanceProvider, ProviderError, StaticAttendanceProvider};
pub use store::{InMemoryPayrollStore, PayrollStore, StoreError};

/// Lifecycle state of the period being composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No attendance loaded.
    Empty,
    /// Attendance loaded and records built, not yet confirmed by a recalculation.
    Loaded,
    /// An input changed and records are stale.
    Dirty,
    /// Records and totals match the current inputs.
    Consistent,
    /// Submitted; no further changes are accepted.
    Finalized,
}

/// Defaults applied when the engine starts and whenever a fetch resets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    /// Fine per missed hour applied to a fresh period.
    pub default_fine_rate: Decimal,
    /// General deductions and allowances applied to a fresh period.
    pub default_ledger: LineItemLedger,
}

/// Options for an attendance fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Keep the current fine rate and general ledger instead of resetting
    /// them to the configured defaults.
    #[serde(default)]
    pub preserve_ledger: bool,
}

/// Identifies one attendance request. Only the latest ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

/// One edit to an ordered line item collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ItemEdit {
    /// Append a blank entry.
    Add,
    /// Rename the entry at `index`.
    Rename {
        /// Position of the entry.
        index: usize,
        /// New name.
        name: String,
    },
    /// Set the amount at `index` from raw input; invalid input becomes zero.
    SetAmount {
        /// Position of the entry.
        index: usize,
        /// Raw amount as typed.
        amount: String,
    },
    /// Remove the entry at `index`; later entries shift down.
    Remove {
        /// Position of the entry.
        index: usize,
    },
}

/// What an [`ItemEdit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// A blank entry was appended at this index.
    Added(usize),
    /// An entry was renamed or re-priced in place.
    Updated,
    /// This entry was removed.
    Removed(LineItem),
}

#[derive(Debug, Clone)]
struct PendingFetch {
    ticket: FetchTicket,
    period: PayPeriod,
    options: FetchOptions,
}

#[derive(Debug, Clone)]
struct EmployeeEntry {
    attendance: AttendanceSummary,
    adjustments: EmployeeAdjustments,
}

/// Composes one payroll period and keeps its records consistent.
///
/// # Example
///
/// ```
/// use payroll_engine::engine::{
///     EngineSettings, EngineState, FetchOptions, RecalculationEngine, StaticAttendanceProvider,
/// };
/// use payroll_engine::models::{AttendanceReport, AttendanceSummary, PayPeriod};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let provider = StaticAttendanceProvider::new(AttendanceReport::from_summaries(vec![
///     AttendanceSummary {
///         employee_id: "emp_001".to_string(),
///         name: "Dewi".to_string(),
///         base_salary: Decimal::from(500_000),
///         total_expected_hours: Decimal::from(160),
///         total_worked_hours: Decimal::from(150),
///         total_missed_hours: Decimal::from(10),
///         attendance_rate: Decimal::new(9375, 2),
///     },
/// ]));
/// let period = PayPeriod {
///     start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
///     pay_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
/// };
///
/// let mut engine = RecalculationEngine::new(EngineSettings::default());
/// engine.fetch_attendance(&provider, period, FetchOptions::default()).await.unwrap();
/// assert_eq!(engine.state(), EngineState::Loaded);
///
/// engine.set_fine_rate(Decimal::from(5_000)).unwrap();
/// assert_eq!(engine.state(), EngineState::Consistent);
/// assert_eq!(engine.totals().unwrap().total_spent, Decimal::from(450_000));
/// # });
/// ```
#[derive(Debug)]
pub struct RecalculationEngine {
    settings: EngineSettings,
    state: EngineState,
    period: Option<PayPeriod>,
    fine_rate: Decimal,
    ledger: LineItemLedger,
    work_hours: Option<WorkHours>,
    entries: Vec<EmployeeEntry>,
    records: Vec<EmployeePayrollRecord>,
    excluded: Vec<ExcludedEmployee>,
    totals: PeriodTotals,
    pending: Option<PendingFetch>,
    last_ticket: u64,
    submitted: Option<PayrollPeriod>,
}

impl RecalculationEngine {
    /// Creates an engine in the `Empty` state.
    pub fn new(settings: EngineSettings) -> Self {
        let fine_rate = non_negative(settings.default_fine_rate);
        let ledger = settings.default_ledger.clone();
        Self {
            settings,
            state: EngineState::Empty,
            period: None,
            fine_rate,
            ledger,
            work_hours: None,
            entries: Vec::new(),
            records: Vec::new(),
            excluded: Vec::new(),
            totals: PeriodTotals::default(),
            pending: None,
            last_ticket: 0,
            submitted: None,
        }
    }

    // ------------------------------------------------------------------
    // Attendance
    // ------------------------------------------------------------------

    /// Starts an attendance request for `period`.
    ///
    /// Prior records are discarded and the engine is `Empty` until the
    /// matching [`complete_fetch`](Self::complete_fetch). Issuing another
    /// request supersedes this one.
    pub fn begin_fetch(
        &mut self,
        period: PayPeriod,
        options: FetchOptions,
    ) -> EngineResult<FetchTicket> {
        self.ensure_not_finalized()?;
        period.validate()?;

        self.last_ticket += 1;
        let ticket = FetchTicket(self.last_ticket);
        if let Some(previous) = self.pending.replace(PendingFetch {
            ticket,
            period,
            options,
        }) {
            debug!(superseded = previous.ticket.0, "Superseding pending attendance request");
        }

        self.clear_records();
        self.state = EngineState::Empty;

        info!(
            ticket = ticket.0,
            period_start = %period.start_date,
            period_end = %period.end_date,
            "Fetching attendance"
        );
        Ok(ticket)
    }

    /// Applies the provider's answer to the request identified by `ticket`.
    ///
    /// Returns `Ok(false)` when the ticket was superseded; the response is
    /// discarded and nothing changes. A provider failure or an empty report
    /// leaves the engine `Empty`. Otherwise records are built and the engine
    /// is `Loaded`. If the records cannot be built, the error is returned and
    /// the engine is left `Empty`.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        response: Result<AttendanceReport, ProviderError>,
    ) -> EngineResult<bool> {
        self.ensure_not_finalized()?;

        let pending = match &self.pending {
            Some(pending) if pending.ticket == ticket => pending.clone(),
            _ => {
                debug!(ticket = ticket.0, "Discarding stale attendance response");
                return Ok(false);
            }
        };
        self.pending = None;
        self.period = Some(pending.period);

        if !pending.options.preserve_ledger {
            self.fine_rate = non_negative(self.settings.default_fine_rate);
            self.ledger = self.settings.default_ledger.clone();
        }

        let report = match response {
            Ok(report) => report,
            Err(err) => {
                warn!(ticket = ticket.0, error = %err, "Attendance fetch failed, treating as no data");
                self.state = EngineState::Empty;
                return Ok(true);
            }
        };

        if report.has_no_data() {
            info!(ticket = ticket.0, "Attendance provider returned no data");
            self.state = EngineState::Empty;
            return Ok(true);
        }

        for employee_id in report.effective_roster() {
            match report.summary_for(&employee_id) {
                Some(summary) => self.entries.push(EmployeeEntry {
                    attendance: summary.clone(),
                    adjustments: EmployeeAdjustments::default(),
                }),
                None => {
                    let reason = EngineError::MissingAttendanceData {
                        employee_id: employee_id.clone(),
                    };
                    warn!(employee_id = %employee_id, "Excluding employee: {}", reason);
                    self.excluded.push(ExcludedEmployee {
                        employee_id,
                        reason: reason.to_string(),
                    });
                }
            }
        }
        self.work_hours = report.work_hours;

        let (records, totals) = match self.derive() {
            Ok(derived) => derived,
            Err(err) => {
                warn!(ticket = ticket.0, error = %err, "Attendance could not be loaded");
                self.clear_records();
                self.state = EngineState::Empty;
                return Err(err);
            }
        };
        self.records = records;
        self.totals = totals;
        self.state = EngineState::Loaded;

        info!(
            ticket = ticket.0,
            employees = self.records.len(),
            excluded = self.excluded.len(),
            "Attendance loaded"
        );
        Ok(true)
    }

    /// Fetches attendance from `provider` and loads it.
    pub async fn fetch_attendance(
        &mut self,
        provider: &dyn AttendanceProvider,
        period: PayPeriod,
        options: FetchOptions,
    ) -> EngineResult<()> {
        let ticket = self.begin_fetch(period, options)?;
        let response = provider.fetch(period.start_date, period.end_date).await;
        self.complete_fetch(ticket, response)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Sets the fine charged per missed hour. Negative rates become zero.
    ///
    /// Every employee's fine is re-derived; at a rate of zero the fine
    /// entries disappear.
    pub fn set_fine_rate(&mut self, rate: Decimal) -> EngineResult<()> {
        self.ensure_configurable()?;
        let rate = non_negative(rate);
        self.change_inputs(|engine| {
            engine.fine_rate = rate;
            Ok(())
        })?;
        debug!(fine_rate = %self.fine_rate, "Fine rate changed");
        Ok(())
    }

    /// Applies one edit to a general deduction or allowance collection.
    pub fn edit_ledger_item(
        &mut self,
        kind: LineItemKind,
        edit: ItemEdit,
    ) -> EngineResult<EditOutcome> {
        self.ensure_configurable()?;
        self.change_inputs(|engine| apply_edit(engine.ledger.collection_mut(kind), edit))
    }

    /// Removes several general items addressed by their current indices.
    pub fn remove_ledger_items(
        &mut self,
        kind: LineItemKind,
        indices: &[usize],
    ) -> EngineResult<Vec<LineItem>> {
        self.ensure_configurable()?;
        self.change_inputs(|engine| engine.ledger.collection_mut(kind).remove_many(indices))
    }

    /// Replaces the whole general ledger.
    pub fn replace_ledger(&mut self, ledger: LineItemLedger) -> EngineResult<()> {
        self.ensure_configurable()?;
        let ledger = LineItemLedger {
            general_deductions: LineItems::from(ledger.general_deductions.as_slice().to_vec()),
            general_allowances: LineItems::from(ledger.general_allowances.as_slice().to_vec()),
        };
        self.change_inputs(|engine| {
            engine.ledger = ledger;
            Ok(())
        })
    }

    /// Applies one edit to an employee's own deductions or allowances.
    ///
    /// An employee item may not be named after the missed-hours fine.
    pub fn edit_employee_item(
        &mut self,
        employee_id: &str,
        kind: LineItemKind,
        edit: ItemEdit,
    ) -> EngineResult<EditOutcome> {
        self.ensure_has_attendance()?;
        if let ItemEdit::Rename { name, .. } = &edit {
            if name == MISSED_HOURS_FINE_LABEL {
                return Err(EngineError::ReservedLineItemName {
                    employee_id: employee_id.to_string(),
                    name: name.clone(),
                });
            }
        }

        self.change_inputs(|engine| {
            let entry = engine.entry_mut(employee_id)?;
            apply_edit(entry.adjustments.collection_mut(kind), edit)
        })
    }

    /// Removes several of an employee's items addressed by their current indices.
    pub fn remove_employee_items(
        &mut self,
        employee_id: &str,
        kind: LineItemKind,
        indices: &[usize],
    ) -> EngineResult<Vec<LineItem>> {
        self.ensure_has_attendance()?;
        self.change_inputs(|engine| {
            let entry = engine.entry_mut(employee_id)?;
            entry.adjustments.collection_mut(kind).remove_many(indices)
        })
    }

    /// Replaces all of an employee's own deductions and allowances.
    pub fn set_employee_adjustments(
        &mut self,
        employee_id: &str,
        adjustments: EmployeeAdjustments,
    ) -> EngineResult<()> {
        self.ensure_has_attendance()?;
        check_reserved_names(employee_id, &adjustments)?;
        let adjustments = EmployeeAdjustments {
            deductions: LineItems::from(adjustments.deductions.as_slice().to_vec()),
            allowances: LineItems::from(adjustments.allowances.as_slice().to_vec()),
        };
        self.change_inputs(|engine| {
            engine.entry_mut(employee_id)?.adjustments = adjustments;
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Recalculation and submission
    // ------------------------------------------------------------------

    /// Re-derives every employee record and the period totals.
    ///
    /// Runs automatically after every input change. Calling it again with no
    /// intervening change produces identical records. On failure the
    /// previous records and totals are kept.
    pub fn recalculate(&mut self) -> EngineResult<()> {
        self.ensure_has_attendance()?;

        let (records, totals) = self.derive()?;
        self.records = records;
        self.totals = totals;
        self.state = EngineState::Consistent;

        debug!(
            employees = self.records.len(),
            total_spent = %self.totals.total_spent,
            "Payroll recalculated"
        );
        Ok(())
    }

    /// Assembles the payload without persisting it.
    ///
    /// Only available while the records are consistent.
    pub fn preview(&self) -> EngineResult<PayrollPeriod> {
        if let Some(submitted) = &self.submitted {
            return Ok(submitted.clone());
        }
        self.ensure_submittable()?;
        self.assemble()
    }

    /// Writes the period to `store` and finalizes the engine.
    ///
    /// Fails with `NotReady` unless the records are consistent and at least
    /// one employee is included. A store failure leaves the engine
    /// `Consistent` so the submission can be retried.
    pub async fn submit(&mut self, store: &dyn PayrollStore) -> EngineResult<PayrollPeriod> {
        self.ensure_not_finalized()?;
        self.ensure_submittable()?;

        let payload = self.assemble()?;
        if let Err(err) = store.save(&payload).await {
            warn!(period_id = %payload.id, error = %err, "Payroll submission failed");
            return Err(EngineError::PersistenceFailed {
                message: err.to_string(),
            });
        }

        self.state = EngineState::Finalized;
        self.submitted = Some(payload.clone());
        info!(
            period_id = %payload.id,
            employees = payload.employees.len(),
            total_spent = %payload.totals.total_spent,
            "Payroll period finalized"
        );
        Ok(payload)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Returns true while an attendance request is outstanding.
    pub fn is_fetch_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The loaded period bounds, if any.
    pub fn period(&self) -> Option<&PayPeriod> {
        self.period.as_ref()
    }

    /// The fine charged per missed hour.
    pub fn fine_rate(&self) -> Decimal {
        self.fine_rate
    }

    /// The general deductions and allowances.
    pub fn ledger(&self) -> &LineItemLedger {
        &self.ledger
    }

    /// Current employee records, in roster order.
    pub fn records(&self) -> &[EmployeePayrollRecord] {
        &self.records
    }

    /// The current record for one employee.
    pub fn record(&self, employee_id: &str) -> Option<&EmployeePayrollRecord> {
        self.records.iter().find(|r| r.employee_id == employee_id)
    }

    /// Rostered employees left out for lack of attendance data.
    pub fn excluded(&self) -> &[ExcludedEmployee] {
        &self.excluded
    }

    /// Period totals, available once the records are consistent.
    ///
    /// A fresh load is `Loaded`, not `Consistent`, so this fails with
    /// `NotReady` until the first input change or an explicit
    /// [`recalculate`](Self::recalculate). [`records`](Self::records) is
    /// readable as soon as attendance loads.
    pub fn totals(&self) -> EngineResult<&PeriodTotals> {
        match self.state {
            EngineState::Consistent | EngineState::Finalized => Ok(&self.totals),
            state => Err(EngineError::not_ready(format!(
                "totals are not available while {:?}",
                state
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Applies an input change and re-derives the records. If either step
    /// fails, every input and the lifecycle state are restored.
    fn change_inputs<T>(
        &mut self,
        change: impl FnOnce(&mut Self) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let snapshot = InputSnapshot::capture(self);
        let result = match change(self) {
            Ok(value) => self.input_changed().map(|()| value),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            debug!(error = %err, "Input change rejected, restoring previous inputs");
            snapshot.restore(self);
        }
        result
    }

    fn input_changed(&mut self) -> EngineResult<()> {
        if self.state == EngineState::Empty {
            // Nothing derived yet; the new inputs apply on the next load.
            return Ok(());
        }
        self.state = EngineState::Dirty;
        self.recalculate()
    }

    fn derive(&self) -> EngineResult<(Vec<EmployeePayrollRecord>, PeriodTotals)> {
        let records = self.build_all()?;
        let totals = aggregate(&records)?;
        Ok((records, totals))
    }

    fn build_all(&self) -> EngineResult<Vec<EmployeePayrollRecord>> {
        self.entries
            .iter()
            .map(|entry| {
                build_record(
                    &entry.attendance.employee_id,
                    Some(&entry.attendance),
                    &self.ledger,
                    &entry.adjustments,
                    self.fine_rate,
                )
            })
            .collect()
    }

    fn assemble(&self) -> EngineResult<PayrollPeriod> {
        let period = self
            .period
            .ok_or_else(|| EngineError::not_ready("no period loaded"))?;
        let header = PeriodHeader {
            period,
            fine_per_missed_hour: self.fine_rate,
            work_hours: self.work_hours.clone(),
            ledger: self.ledger.clone(),
        };
        assemble_period(
            header,
            self.records.clone(),
            self.excluded.clone(),
            Utc::now(),
        )
    }

    fn clear_records(&mut self) {
        self.entries.clear();
        self.records.clear();
        self.excluded.clear();
        self.totals = PeriodTotals::default();
        self.work_hours = None;
    }

    fn entry_mut(&mut self, employee_id: &str) -> EngineResult<&mut EmployeeEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.attendance.employee_id == employee_id)
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })
    }

    fn ensure_not_finalized(&self) -> EngineResult<()> {
        if self.state == EngineState::Finalized {
            return Err(EngineError::PeriodFinalized);
        }
        Ok(())
    }

    /// Fine rate and general ledger may be prepared before attendance loads.
    fn ensure_configurable(&self) -> EngineResult<()> {
        self.ensure_not_finalized()?;
        if self.pending.is_some() {
            return Err(EngineError::not_ready("attendance fetch pending"));
        }
        Ok(())
    }

    fn ensure_has_attendance(&self) -> EngineResult<()> {
        self.ensure_configurable()?;
        if self.state == EngineState::Empty {
            return Err(EngineError::not_ready("no attendance loaded"));
        }
        Ok(())
    }

    fn ensure_submittable(&self) -> EngineResult<()> {
        if self.pending.is_some() {
            return Err(EngineError::not_ready("attendance fetch pending"));
        }
        if self.state != EngineState::Consistent {
            return Err(EngineError::not_ready(format!(
                "records must be consistent, engine is {:?}",
                self.state
            )));
        }
        if self.records.is_empty() {
            return Err(EngineError::not_ready("no employees in period"));
        }
        Ok(())
    }
}

/// The editable inputs, captured so a failed change can be undone.
struct InputSnapshot {
    state: EngineState,
    fine_rate: Decimal,
    ledger: LineItemLedger,
    adjustments: Vec<EmployeeAdjustments>,
}

impl InputSnapshot {
    fn capture(engine: &RecalculationEngine) -> Self {
        Self {
            state: engine.state,
            fine_rate: engine.fine_rate,
            ledger: engine.ledger.clone(),
            adjustments: engine
                .entries
                .iter()
                .map(|entry| entry.adjustments.clone())
                .collect(),
        }
    }

    fn restore(self, engine: &mut RecalculationEngine) {
        engine.state = self.state;
        engine.fine_rate = self.fine_rate;
        engine.ledger = self.ledger;
        for (entry, adjustments) in engine.entries.iter_mut().zip(self.adjustments) {
            entry.adjustments = adjustments;
        }
    }
}

fn apply_edit(items: &mut LineItems, edit: ItemEdit) -> EngineResult<EditOutcome> {
    match edit {
        ItemEdit::Add => Ok(EditOutcome::Added(items.add())),
        ItemEdit::Rename { index, name } => {
            items.update_name(index, name)?;
            Ok(EditOutcome::Updated)
        }
        ItemEdit::SetAmount { index, amount } => {
            items.update_amount(index, &amount)?;
            Ok(EditOutcome::Updated)
        }
        ItemEdit::Remove { index } => Ok(EditOutcome::Removed(items.remove(index)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn january() -> PayPeriod {
        PayPeriod {
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            pay_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        }
    }

    fn summary(id: &str, base: &str, missed: &str) -> AttendanceSummary {
        AttendanceSummary {
            employee_id: id.to_string(),
            name: format!("Employee {}", id),
            base_salary: dec(base),
            total_expected_hours: dec("160"),
            total_worked_hours: dec("160") - dec(missed),
            total_missed_hours: dec(missed),
            attendance_rate: dec("100"),
        }
    }

    fn loaded_engine(summaries: Vec<AttendanceSummary>) -> RecalculationEngine {
        let mut engine = RecalculationEngine::new(EngineSettings::default());
        let ticket = engine.begin_fetch(january(), FetchOptions::default()).unwrap();
        engine
            .complete_fetch(ticket, Ok(AttendanceReport::from_summaries(summaries)))
            .unwrap();
        engine
    }

    fn add_item(engine: &mut RecalculationEngine, kind: LineItemKind, name: &str, amount: &str) {
        let index = match engine.edit_ledger_item(kind, ItemEdit::Add).unwrap() {
            EditOutcome::Added(index) => index,
            other => panic!("Expected Added, got {:?}", other),
        };
        engine
            .edit_ledger_item(
                kind,
                ItemEdit::Rename {
                    index,
                    name: name.to_string(),
                },
            )
            .unwrap();
        engine
            .edit_ledger_item(
                kind,
                ItemEdit::SetAmount {
                    index,
                    amount: amount.to_string(),
                },
            )
            .unwrap();
    }

    struct FailingStore;

    #[async_trait]
    impl PayrollStore for FailingStore {
        async fn save(&self, _period: &PayrollPeriod) -> Result<(), StoreError> {
            Err(StoreError::WriteFailed {
                message: "disk full".to_string(),
            })
        }

        async fn get(&self, _id: Uuid) -> Option<PayrollPeriod> {
            None
        }

        async fn list(&self) -> Vec<PayrollPeriod> {
            vec![]
        }
    }

    #[test]
    fn test_new_engine_is_empty() {
        let engine = RecalculationEngine::new(EngineSettings::default());
        assert_eq!(engine.state(), EngineState::Empty);
        assert!(engine.records().is_empty());
        assert!(engine.totals().is_err());
    }

    #[test]
    fn test_fetch_loads_records_without_adjustments() {
        let engine = loaded_engine(vec![summary("a", "500000", "10")]);
        assert_eq!(engine.state(), EngineState::Loaded);
        let record = engine.record("a").unwrap();
        assert_eq!(record.net_pay, dec("500000"));
        assert!(record.employee_deductions.is_empty());
    }

    #[test]
    fn test_scenario_a_fine_from_missed_hours() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        engine.set_fine_rate(dec("5000")).unwrap();

        let record = engine.record("a").unwrap();
        assert_eq!(record.fine_amount(), dec("50000"));
        assert_eq!(record.net_pay, dec("450000"));
        assert_eq!(engine.state(), EngineState::Consistent);
    }

    #[test]
    fn test_scenario_b_general_items_apply() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        engine.set_fine_rate(dec("5000")).unwrap();
        add_item(&mut engine, LineItemKind::Deduction, "Tax", "20000");
        add_item(&mut engine, LineItemKind::Allowance, "Transport", "15000");

        assert_eq!(engine.record("a").unwrap().net_pay, dec("445000"));
        assert_eq!(engine.totals().unwrap().total_spent, dec("445000"));
    }

    #[test]
    fn test_scenario_c_net_pay_never_negative() {
        let mut engine = loaded_engine(vec![summary("a", "100000", "0")]);
        add_item(&mut engine, LineItemKind::Deduction, "Advance", "200000");

        assert_eq!(engine.record("a").unwrap().net_pay, Decimal::ZERO);
        assert_eq!(engine.totals().unwrap().total_spent, Decimal::ZERO);
    }

    #[test]
    fn test_scenario_d_zero_rate_removes_fine_entry() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        engine.set_fine_rate(dec("5000")).unwrap();
        assert!(engine.record("a").unwrap().missed_hours_fine().is_some());

        engine.set_fine_rate(Decimal::ZERO).unwrap();

        let record = engine.record("a").unwrap();
        assert!(record.missed_hours_fine().is_none());
        assert!(
            record
                .employee_deductions
                .iter()
                .all(|item| item.name != MISSED_HOURS_FINE_LABEL)
        );
        assert_eq!(record.net_pay, dec("500000"));
    }

    #[test]
    fn test_scenario_e_employee_without_attendance_is_excluded() {
        let mut engine = RecalculationEngine::new(EngineSettings::default());
        let ticket = engine.begin_fetch(january(), FetchOptions::default()).unwrap();
        let report = AttendanceReport {
            summaries: vec![summary("a", "500000", "0")],
            roster: vec!["a".to_string(), "b".to_string()],
            work_hours: None,
        };
        engine.complete_fetch(ticket, Ok(report)).unwrap();
        engine.recalculate().unwrap();

        assert_eq!(engine.records().len(), 1);
        assert!(engine.record("b").is_none());
        assert_eq!(engine.excluded().len(), 1);
        assert_eq!(engine.excluded()[0].employee_id, "b");
        assert_eq!(engine.totals().unwrap().total_spent, dec("500000"));
    }

    #[test]
    fn test_fine_rate_change_recomputes_every_employee() {
        let mut engine = loaded_engine(vec![
            summary("a", "500000", "10"),
            summary("b", "400000", "4"),
            summary("c", "300000", "0"),
        ]);
        engine.set_fine_rate(dec("1000")).unwrap();

        assert_eq!(engine.record("a").unwrap().fine_amount(), dec("10000"));
        assert_eq!(engine.record("b").unwrap().fine_amount(), dec("4000"));
        assert!(engine.record("c").unwrap().missed_hours_fine().is_none());
        assert_eq!(engine.totals().unwrap().total_fines, dec("14000"));
        assert_eq!(engine.totals().unwrap().total_spent, dec("1186000"));
    }

    #[test]
    fn test_general_edit_affects_all_employee_edit_affects_one() {
        let mut engine = loaded_engine(vec![summary("a", "100", "0"), summary("b", "100", "0")]);
        add_item(&mut engine, LineItemKind::Allowance, "Meal", "10");
        assert_eq!(engine.record("a").unwrap().net_pay, dec("110"));
        assert_eq!(engine.record("b").unwrap().net_pay, dec("110"));

        engine
            .edit_employee_item("b", LineItemKind::Deduction, ItemEdit::Add)
            .unwrap();
        engine
            .edit_employee_item(
                "b",
                LineItemKind::Deduction,
                ItemEdit::SetAmount {
                    index: 0,
                    amount: "25".to_string(),
                },
            )
            .unwrap();

        assert_eq!(engine.record("a").unwrap().net_pay, dec("110"));
        assert_eq!(engine.record("b").unwrap().net_pay, dec("85"));
        assert_eq!(engine.totals().unwrap().total_spent, dec("195"));
    }

    #[test]
    fn test_employee_item_keeps_fine_first() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        engine.set_fine_rate(dec("5000")).unwrap();
        engine
            .edit_employee_item("a", LineItemKind::Deduction, ItemEdit::Add)
            .unwrap();
        engine
            .edit_employee_item(
                "a",
                LineItemKind::Deduction,
                ItemEdit::Rename {
                    index: 0,
                    name: "Loan".to_string(),
                },
            )
            .unwrap();

        let names: Vec<&str> = engine
            .record("a")
            .unwrap()
            .employee_deductions
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec![MISSED_HOURS_FINE_LABEL, "Loan"]);
    }

    #[test]
    fn test_employee_item_cannot_take_fine_name() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        engine
            .edit_employee_item("a", LineItemKind::Deduction, ItemEdit::Add)
            .unwrap();
        let result = engine.edit_employee_item(
            "a",
            LineItemKind::Deduction,
            ItemEdit::Rename {
                index: 0,
                name: MISSED_HOURS_FINE_LABEL.to_string(),
            },
        );
        assert!(matches!(
            result,
            Err(EngineError::ReservedLineItemName { .. })
        ));
    }

    #[test]
    fn test_unknown_employee_edit_fails() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        let result = engine.edit_employee_item("zz", LineItemKind::Allowance, ItemEdit::Add);
        assert!(matches!(result, Err(EngineError::EmployeeNotFound { .. })));
    }

    #[test]
    fn test_failed_edit_leaves_state_untouched() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        let result = engine.edit_ledger_item(LineItemKind::Deduction, ItemEdit::Remove { index: 0 });
        assert!(matches!(
            result,
            Err(EngineError::LineItemIndexOutOfRange { .. })
        ));
        assert_eq!(engine.state(), EngineState::Loaded);
    }

    #[test]
    fn test_overflowing_ledger_edit_is_rolled_back() {
        let mut huge = summary("a", "0", "0");
        huge.base_salary = Decimal::MAX;
        let mut engine = loaded_engine(vec![huge]);
        add_item(&mut engine, LineItemKind::Allowance, "Transport", "0");
        let before: Vec<EmployeePayrollRecord> = engine.records().to_vec();

        let result = engine.edit_ledger_item(
            LineItemKind::Allowance,
            ItemEdit::SetAmount {
                index: 0,
                amount: "1".to_string(),
            },
        );

        assert!(matches!(result, Err(EngineError::AmountOverflow { .. })));
        assert_eq!(engine.state(), EngineState::Consistent);
        assert_eq!(
            engine.ledger().general_allowances.get(0).unwrap().amount,
            Decimal::ZERO
        );
        assert_eq!(engine.records(), before.as_slice());
        assert_eq!(engine.totals().unwrap().total_spent, Decimal::MAX);
    }

    #[test]
    fn test_overflowing_fine_rate_is_rolled_back() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        engine.set_fine_rate(dec("5000")).unwrap();

        let result = engine.set_fine_rate(Decimal::MAX);

        assert!(matches!(result, Err(EngineError::AmountOverflow { .. })));
        assert_eq!(engine.fine_rate(), dec("5000"));
        assert_eq!(engine.record("a").unwrap().net_pay, dec("450000"));
        assert_eq!(engine.state(), EngineState::Consistent);
    }

    #[test]
    fn test_overflowing_employee_adjustments_are_rolled_back() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "0")]);
        let mut loan = EmployeeAdjustments::default();
        loan.deductions.push(LineItem::new("Loan", dec("1000")));
        engine.set_employee_adjustments("a", loan).unwrap();

        let mut huge = EmployeeAdjustments::default();
        huge.allowances.push(LineItem::new("Bonus", Decimal::MAX));
        let result = engine.set_employee_adjustments("a", huge);

        assert!(matches!(result, Err(EngineError::AmountOverflow { .. })));
        let record = engine.record("a").unwrap();
        assert_eq!(record.net_pay, dec("499000"));
        assert!(record.employee_allowances.is_empty());

        // The restored adjustments survive the next recalculation.
        engine.recalculate().unwrap();
        assert_eq!(engine.record("a").unwrap().net_pay, dec("499000"));
    }

    #[test]
    fn test_overflowing_load_leaves_engine_empty() {
        let mut first = summary("a", "0", "0");
        first.base_salary = Decimal::MAX;
        let mut second = summary("b", "0", "0");
        second.base_salary = Decimal::MAX;

        let mut engine = RecalculationEngine::new(EngineSettings::default());
        let ticket = engine.begin_fetch(january(), FetchOptions::default()).unwrap();
        let result =
            engine.complete_fetch(ticket, Ok(AttendanceReport::from_summaries(vec![first, second])));

        assert!(matches!(result, Err(EngineError::AmountOverflow { .. })));
        assert_eq!(engine.state(), EngineState::Empty);
        assert!(engine.records().is_empty());
        assert!(!engine.is_fetch_pending());
    }

    #[test]
    fn test_totals_need_a_recalculation_after_load() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        assert_eq!(engine.record("a").unwrap().net_pay, dec("500000"));
        assert!(matches!(
            engine.totals(),
            Err(EngineError::NotReady { .. })
        ));

        engine.recalculate().unwrap();
        assert_eq!(engine.totals().unwrap().total_spent, dec("500000"));
    }

    #[test]
    fn test_remove_ledger_items_batch() {
        let mut engine = loaded_engine(vec![summary("a", "1000", "0")]);
        add_item(&mut engine, LineItemKind::Deduction, "A", "1");
        add_item(&mut engine, LineItemKind::Deduction, "B", "10");
        add_item(&mut engine, LineItemKind::Deduction, "C", "100");

        let removed = engine
            .remove_ledger_items(LineItemKind::Deduction, &[0, 2])
            .unwrap();

        assert_eq!(removed.len(), 2);
        assert_eq!(engine.ledger().general_deductions.len(), 1);
        assert_eq!(engine.ledger().general_deductions.get(0).unwrap().name, "B");
        assert_eq!(engine.record("a").unwrap().net_pay, dec("990"));
    }

    #[test]
    fn test_recalculate_is_idempotent() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10"), summary("b", "1", "1")]);
        engine.set_fine_rate(dec("3333.33")).unwrap();

        let first: Vec<EmployeePayrollRecord> = engine.records().to_vec();
        engine.recalculate().unwrap();
        let second: Vec<EmployeePayrollRecord> = engine.records().to_vec();

        assert_eq!(first, second);
        assert_eq!(engine.state(), EngineState::Consistent);
    }

    #[test]
    fn test_invalid_period_is_rejected() {
        let mut engine = RecalculationEngine::new(EngineSettings::default());
        let mut period = january();
        period.pay_date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let result = engine.begin_fetch(period, FetchOptions::default());
        assert!(matches!(result, Err(EngineError::InvalidPeriod { .. })));
        assert!(!engine.is_fetch_pending());
    }

    #[test]
    fn test_stale_fetch_response_is_discarded() {
        let mut engine = RecalculationEngine::new(EngineSettings::default());
        let first = engine.begin_fetch(january(), FetchOptions::default()).unwrap();
        let second = engine.begin_fetch(january(), FetchOptions::default()).unwrap();

        let applied = engine
            .complete_fetch(
                first,
                Ok(AttendanceReport::from_summaries(vec![summary("old", "1", "0")])),
            )
            .unwrap();
        assert!(!applied);
        assert!(engine.records().is_empty());
        assert!(engine.is_fetch_pending());

        let applied = engine
            .complete_fetch(
                second,
                Ok(AttendanceReport::from_summaries(vec![summary("new", "2", "0")])),
            )
            .unwrap();
        assert!(applied);
        assert!(engine.record("new").is_some());
        assert!(engine.record("old").is_none());

        // A late answer to the first request changes nothing.
        let applied = engine
            .complete_fetch(
                first,
                Ok(AttendanceReport::from_summaries(vec![summary("old", "1", "0")])),
            )
            .unwrap();
        assert!(!applied);
        assert_eq!(engine.records().len(), 1);
    }

    #[test]
    fn test_mutations_rejected_while_fetch_pending() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        engine.begin_fetch(january(), FetchOptions::default()).unwrap();

        assert!(matches!(
            engine.set_fine_rate(dec("1")),
            Err(EngineError::NotReady { .. })
        ));
        assert!(matches!(
            engine.edit_ledger_item(LineItemKind::Deduction, ItemEdit::Add),
            Err(EngineError::NotReady { .. })
        ));
        assert!(matches!(
            engine.recalculate(),
            Err(EngineError::NotReady { .. })
        ));
        assert_eq!(engine.state(), EngineState::Empty);
    }

    #[test]
    fn test_provider_failure_returns_to_empty() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        let ticket = engine.begin_fetch(january(), FetchOptions::default()).unwrap();
        let applied = engine
            .complete_fetch(ticket, Err(ProviderError::Status { status: 500 }))
            .unwrap();

        assert!(applied);
        assert_eq!(engine.state(), EngineState::Empty);
        assert!(engine.records().is_empty());
    }

    #[test]
    fn test_empty_report_returns_to_empty() {
        let mut engine = loaded_engine(vec![]);
        assert_eq!(engine.state(), EngineState::Empty);
        assert!(matches!(
            engine.recalculate(),
            Err(EngineError::NotReady { .. })
        ));
    }

    #[test]
    fn test_refetch_resets_ledger_by_default() {
        let settings = EngineSettings {
            default_fine_rate: dec("100"),
            default_ledger: LineItemLedger::new(),
        };
        let mut engine = RecalculationEngine::new(settings);
        let ticket = engine.begin_fetch(january(), FetchOptions::default()).unwrap();
        engine
            .complete_fetch(
                ticket,
                Ok(AttendanceReport::from_summaries(vec![summary("a", "1000", "1")])),
            )
            .unwrap();
        engine.set_fine_rate(dec("5")).unwrap();
        add_item(&mut engine, LineItemKind::Deduction, "Tax", "10");

        let ticket = engine.begin_fetch(january(), FetchOptions::default()).unwrap();
        engine
            .complete_fetch(
                ticket,
                Ok(AttendanceReport::from_summaries(vec![summary("a", "1000", "1")])),
            )
            .unwrap();

        assert_eq!(engine.fine_rate(), dec("100"));
        assert!(engine.ledger().general_deductions.is_empty());
        assert_eq!(engine.record("a").unwrap().net_pay, dec("900"));
    }

    #[test]
    fn test_refetch_can_preserve_ledger() {
        let mut engine = loaded_engine(vec![summary("a", "1000", "1")]);
        engine.set_fine_rate(dec("5")).unwrap();
        add_item(&mut engine, LineItemKind::Deduction, "Tax", "10");
        engine
            .edit_employee_item("a", LineItemKind::Allowance, ItemEdit::Add)
            .unwrap();

        let options = FetchOptions {
            preserve_ledger: true,
        };
        let ticket = engine.begin_fetch(january(), options).unwrap();
        engine
            .complete_fetch(
                ticket,
                Ok(AttendanceReport::from_summaries(vec![summary("a", "1000", "1")])),
            )
            .unwrap();

        assert_eq!(engine.fine_rate(), dec("5"));
        assert_eq!(engine.ledger().general_deductions.len(), 1);
        assert!(engine.record("a").unwrap().employee_allowances.is_empty());
        assert_eq!(engine.record("a").unwrap().net_pay, dec("985"));
    }

    #[test]
    fn test_ledger_can_be_prepared_before_fetch() {
        let mut engine = RecalculationEngine::new(EngineSettings::default());
        engine.set_fine_rate(dec("10")).unwrap();
        assert_eq!(engine.state(), EngineState::Empty);

        let ticket = engine
            .begin_fetch(
                january(),
                FetchOptions {
                    preserve_ledger: true,
                },
            )
            .unwrap();
        engine
            .complete_fetch(
                ticket,
                Ok(AttendanceReport::from_summaries(vec![summary("a", "1000", "2")])),
            )
            .unwrap();

        assert_eq!(engine.record("a").unwrap().fine_amount(), dec("20"));
    }

    #[test]
    fn test_employee_edits_require_attendance() {
        let mut engine = RecalculationEngine::new(EngineSettings::default());
        let result = engine.edit_employee_item("a", LineItemKind::Deduction, ItemEdit::Add);
        assert!(matches!(result, Err(EngineError::NotReady { .. })));
    }

    #[test]
    fn test_set_employee_adjustments_validates_names() {
        let mut engine = loaded_engine(vec![summary("a", "1000", "0")]);
        let mut adjustments = EmployeeAdjustments::default();
        adjustments
            .deductions
            .push(LineItem::new(MISSED_HOURS_FINE_LABEL, dec("1")));

        let result = engine.set_employee_adjustments("a", adjustments);
        assert!(matches!(
            result,
            Err(EngineError::ReservedLineItemName { .. })
        ));

        let mut adjustments = EmployeeAdjustments::default();
        adjustments.allowances.push(LineItem::new("Bonus", dec("50")));
        engine.set_employee_adjustments("a", adjustments).unwrap();
        assert_eq!(engine.record("a").unwrap().net_pay, dec("1050"));
    }

    #[tokio::test]
    async fn test_fetch_attendance_uses_provider() {
        let provider = StaticAttendanceProvider::new(AttendanceReport::from_summaries(vec![
            summary("a", "500000", "10"),
        ]));
        let mut engine = RecalculationEngine::new(EngineSettings::default());
        engine
            .fetch_attendance(&provider, january(), FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(engine.state(), EngineState::Loaded);
        assert_eq!(engine.period(), Some(&january()));
    }

    #[tokio::test]
    async fn test_submit_requires_consistent_state() {
        let store = InMemoryPayrollStore::new();
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);

        let result = engine.submit(&store).await;
        assert!(matches!(result, Err(EngineError::NotReady { .. })));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_with_no_employees_fails() {
        let store = InMemoryPayrollStore::new();
        let mut engine = loaded_engine(vec![]);
        let result = engine.submit(&store).await;
        assert!(matches!(result, Err(EngineError::NotReady { .. })));
    }

    #[tokio::test]
    async fn test_submit_finalizes_and_persists() {
        let store = InMemoryPayrollStore::new();
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        engine.set_fine_rate(dec("5000")).unwrap();

        let payload = engine.submit(&store).await.unwrap();

        assert_eq!(engine.state(), EngineState::Finalized);
        assert_eq!(payload.totals.total_spent, dec("450000"));
        assert_eq!(payload.totals.total_fines, dec("50000"));
        assert_eq!(store.get(payload.id).await, Some(payload.clone()));
        assert_eq!(engine.preview().unwrap(), payload);

        assert!(matches!(
            engine.set_fine_rate(dec("1")),
            Err(EngineError::PeriodFinalized)
        ));
        assert!(matches!(
            engine.begin_fetch(january(), FetchOptions::default()),
            Err(EngineError::PeriodFinalized)
        ));
        assert!(matches!(
            engine.submit(&store).await,
            Err(EngineError::PeriodFinalized)
        ));
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submit_stays_consistent() {
        let mut engine = loaded_engine(vec![summary("a", "500000", "10")]);
        engine.recalculate().unwrap();

        let result = engine.submit(&FailingStore).await;

        match result {
            Err(EngineError::PersistenceFailed { message }) => {
                assert!(message.contains("disk full"));
            }
            other => panic!("Expected PersistenceFailed, got {:?}", other),
        }
        assert_eq!(engine.state(), EngineState::Consistent);

        let store = InMemoryPayrollStore::new();
        assert!(engine.submit(&store).await.is_ok());
    }
}
