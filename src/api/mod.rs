//! HTTP API module for the payroll engine.
//!
//! This module provides the REST endpoints for previewing, submitting and
//! reporting on payroll periods.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{PayPeriodRequest, PayrollRequest};
pub use response::{ApiError, ApiErrorResponse, PeriodReportResponse};
pub use state::AppState;
