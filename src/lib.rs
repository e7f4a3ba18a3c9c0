//! Payroll Computation Engine
//!
//! This crate composes a payroll period from per-employee attendance
//! summaries and a set of configurable adjustments: general and
//! per-employee deductions and allowances, plus a fine charged for every
//! missed hour. It keeps every employee's net pay and the period totals
//! consistent with those inputs and hands the result to a payroll store.
//!
//! The pieces, bottom-up:
//!
//! - [`models`]: attendance, line items, records and the period payload
//! - [`calculation`]: the fine calculator, the line item ledger, the record
//!   builder and the period aggregator
//! - [`engine`]: the recalculation state machine with its provider and
//!   store seams
//! - [`config`] and [`api`]: YAML defaults and the HTTP surface

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
