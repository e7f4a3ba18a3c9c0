//! Response types for the payroll API.
//!
//! This module defines the error response structures, the mapping from
//! [`EngineError`] to HTTP status codes, and the report body returned by
//! the period listing endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::config::CurrencyConfig;
use crate::error::EngineError;
use crate::models::PeriodReport;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates a period not found error response.
    pub fn period_not_found(id: impl std::fmt::Display) -> Self {
        Self::new("PERIOD_NOT_FOUND", format!("Payroll period not found: {}", id))
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Pairs an error body with a status code.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::MissingAttendanceData { employee_id } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details(
                    "MISSING_ATTENDANCE",
                    message,
                    format!("No attendance summary was supplied for '{}'", employee_id),
                ),
            ),
            EngineError::NotReady { .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("NOT_READY", message),
            ),
            EngineError::InvalidPeriod { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::validation_error(message),
            ),
            EngineError::PeriodFinalized => ApiErrorResponse::new(
                StatusCode::CONFLICT,
                ApiError::new("PERIOD_FINALIZED", message),
            ),
            EngineError::LineItemIndexOutOfRange { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_LINE_ITEM_INDEX", message),
            ),
            EngineError::ReservedLineItemName { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "RESERVED_LINE_ITEM_NAME",
                    message,
                    "The missed-hours fine is derived from attendance and cannot be entered by hand",
                ),
            ),
            EngineError::EmployeeNotFound { .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("EMPLOYEE_NOT_FOUND", message),
            ),
            EngineError::AmountOverflow { .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("AMOUNT_OVERFLOW", message),
            ),
            EngineError::PersistenceFailed { message: cause } => ApiErrorResponse::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::with_details("PERSISTENCE_FAILED", "Payroll period was not saved", cause),
            ),
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiErrorResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                )
            }
        }
    }
}

/// A period report with human-readable totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodReportResponse {
    /// The report itself.
    #[serde(flatten)]
    pub report: PeriodReport,
    /// `total_spent` formatted in the configured currency.
    pub total_spent_display: String,
    /// `total_fines` formatted in the configured currency.
    pub total_fines_display: String,
}

impl PeriodReportResponse {
    /// Wraps `report`, formatting its totals with `currency`.
    pub fn new(report: PeriodReport, currency: &CurrencyConfig) -> Self {
        Self {
            total_spent_display: currency.format(report.totals.total_spent),
            total_fines_display: currency.format(report.totals.total_fines),
            report,
        }
    }
}
