//! The attendance provider seam.
//!
//! Attendance aggregation lives outside the engine. The engine only needs a
//! way to ask for one period's summaries, which [`AttendanceProvider`]
//! captures so tests and the HTTP layer can supply data without network I/O.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::AttendanceReport;

/// Failures reported by an attendance provider.
///
/// The engine never surfaces these to its caller: any provider failure is
/// treated as "no data" and the engine returns to `Empty`.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("Attendance provider responded with status {status}")]
    Status {
        /// The status code returned.
        status: u16,
    },

    /// The provider could not be reached or returned garbage.
    #[error("Attendance provider unavailable: {message}")]
    Unavailable {
        /// A description of the failure.
        message: String,
    },
}

/// Supplies per-employee attendance summaries for a date range.
#[async_trait]
pub trait AttendanceProvider: Send + Sync {
    /// Fetches the attendance report for `start..=end`.
    async fn fetch(&self, start: NaiveDate, end: NaiveDate)
    -> Result<AttendanceReport, ProviderError>;
}

/// A provider that always answers with the same report.
///
/// Used by the HTTP layer, where attendance arrives in the request body, and
/// by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAttendanceProvider {
    report: AttendanceReport,
}

impl StaticAttendanceProvider {
    /// Creates a provider answering with `report`.
    pub fn new(report: AttendanceReport) -> Self {
        Self { report }
    }
}

#[async_trait]
impl AttendanceProvider for StaticAttendanceProvider {
    async fn fetch(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<AttendanceReport, ProviderError> {
        Ok(self.report.clone())
    }
}
