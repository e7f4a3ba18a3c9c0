//! Calculation logic for the payroll engine.
//!
//! This module contains the pure building blocks of a payroll computation:
//! the ordered line item ledger, the missed-hours fine, per-employee record
//! construction, and period aggregation.

mod aggregator;
mod fine;
mod ledger;
mod record_builder;

pub use aggregator::{aggregate, assemble_period, totals_match};
pub use fine::{FineResult, calculate_missed_hours_fine, compute_fine};
pub use ledger::{EmployeeAdjustments, LineItemLedger, LineItems};
pub use record_builder::build_record;
pub(crate) use record_builder::check_reserved_names;
