//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while composing and submitting a
//! payroll period. Invalid line item amounts are not errors: they are
//! coerced to zero where they enter the engine.

use thiserror::Error;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::MissingAttendanceData {
///     employee_id: "emp_007".to_string(),
/// };
/// assert_eq!(error.to_string(), "No attendance data for employee 'emp_007'");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// An employee record was requested without a backing attendance summary.
    #[error("No attendance data for employee '{employee_id}'")]
    MissingAttendanceData {
        /// The employee with no attendance summary.
        employee_id: String,
    },

    /// The engine is not in a state that allows the operation.
    #[error("Engine not ready: {reason}")]
    NotReady {
        /// Why the operation cannot run now.
        reason: String,
    },

    /// Period bounds are inconsistent.
    #[error("Invalid period: {message}")]
    InvalidPeriod {
        /// What is wrong with the bounds.
        message: String,
    },

    /// The period was submitted and can no longer change.
    #[error("Payroll period is finalized and cannot be modified")]
    PeriodFinalized,

    /// A line item index does not address an entry.
    #[error("Line item index {index} out of range for {len} entries")]
    LineItemIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of entries in the collection.
        len: usize,
    },

    /// An employee item tried to use the name reserved for the derived fine.
    #[error("Employee '{employee_id}' cannot have a manual item named '{name}'")]
    ReservedLineItemName {
        /// The employee whose item was rejected.
        employee_id: String,
        /// The reserved name.
        name: String,
    },

    /// No record exists for the employee in the current period.
    #[error("Employee not found in period: {employee_id}")]
    EmployeeNotFound {
        /// The unknown employee id.
        employee_id: String,
    },

    /// A money sum or product exceeded the range of the decimal type.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow {
        /// The figure being computed.
        context: String,
    },

    /// The payroll store rejected the submission.
    #[error("Failed to persist payroll period: {message}")]
    PersistenceFailed {
        /// A description of the store failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::NotReady`] error.
    pub fn not_ready(reason: impl Into<String>) -> Self {
        EngineError::NotReady {
            reason: reason.into(),
        }
    }
}

impl EngineError {
    /// Shorthand for a [`EngineError::AmountOverflow`] error.
    pub fn overflow(context: impl Into<String>) -> Self {
        EngineError::AmountOverflow {
            context: context.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
