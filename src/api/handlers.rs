//! HTTP request handlers for the payroll API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{FetchOptions, RecalculationEngine, StaticAttendanceProvider};
use crate::error::EngineResult;
use crate::models::PayPeriod;

use super::request::PayrollRequest;
use super::response::{ApiError, ApiErrorResponse, PeriodReportResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/payroll/preview", post(preview_handler))
        .route("/payroll/periods", post(submit_handler).get(list_periods_handler))
        .route("/payroll/periods/:id", get(get_period_handler))
        .with_state(state)
}

/// Handler for POST /payroll/preview.
///
/// Computes the period from the request and returns the payload without
/// saving it.
async fn preview_handler(
    State(state): State<AppState>,
    payload: Result<Json<PayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll preview");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    let result = match compose(&state, request).await {
        Ok(engine) => engine.preview(),
        Err(err) => Err(err),
    };

    match result {
        Ok(period) => {
            info!(
                correlation_id = %correlation_id,
                employees = period.employees.len(),
                total_spent = %period.totals.total_spent,
                duration_us = start_time.elapsed().as_micros(),
                "Payroll preview computed"
            );
            (StatusCode::OK, Json(period)).into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Payroll preview failed");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for POST /payroll/periods.
///
/// Computes the period from the request and submits it to the store.
async fn submit_handler(
    State(state): State<AppState>,
    payload: Result<Json<PayrollRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll submission");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let mut engine = match compose(&state, request).await {
        Ok(engine) => engine,
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Payroll submission rejected");
            return ApiErrorResponse::from(err).into_response();
        }
    };

    match engine.submit(state.store()).await {
        Ok(period) => {
            info!(
                correlation_id = %correlation_id,
                period_id = %period.id,
                employees = period.employees.len(),
                total_spent = %period.totals.total_spent,
                "Payroll period submitted"
            );
            (StatusCode::CREATED, Json(period)).into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Payroll submission failed");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for GET /payroll/periods.
async fn list_periods_handler(State(state): State<AppState>) -> Response {
    let currency = state.config().currency();
    let reports: Vec<PeriodReportResponse> = state
        .store()
        .list()
        .await
        .iter()
        .map(|period| PeriodReportResponse::new(period.report(), currency))
        .collect();
    (StatusCode::OK, Json(reports)).into_response()
}

/// Handler for GET /payroll/periods/:id.
async fn get_period_handler(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => {
            return ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::validation_error(rejection.body_text()),
            )
            .into_response();
        }
    };

    match state.store().get(id).await {
        Some(period) => {
            let report = PeriodReportResponse::new(period.report(), state.config().currency());
            (StatusCode::OK, Json(report)).into_response()
        }
        None => {
            ApiErrorResponse::new(StatusCode::NOT_FOUND, ApiError::period_not_found(id))
                .into_response()
        }
    }
}

/// Runs a request through a fresh engine up to a consistent state.
async fn compose(state: &AppState, request: PayrollRequest) -> EngineResult<RecalculationEngine> {
    let mut engine = RecalculationEngine::new(state.config().engine_settings());
    let period: PayPeriod = request.period.into();

    // Rate and ledger go in before the load so a single build sees them.
    let options = FetchOptions {
        preserve_ledger: true,
    };
    if let Some(rate) = request.fine_per_missed_hour {
        engine.set_fine_rate(rate)?;
    }
    if let Some(ledger) = request.ledger {
        engine.replace_ledger(ledger)?;
    }

    let provider = StaticAttendanceProvider::new(request.attendance);
    engine.fetch_attendance(&provider, period, options).await?;

    for (employee_id, adjustments) in request.employee_adjustments {
        if engine
            .excluded()
            .iter()
            .any(|excluded| excluded.employee_id == employee_id)
        {
            warn!(
                employee_id = %employee_id,
                "Ignoring adjustments for employee excluded from the period"
            );
            continue;
        }
        engine.set_employee_adjustments(&employee_id, adjustments)?;
    }
    engine.recalculate()?;
    Ok(engine)
}

/// Turns a JSON extraction failure into a 400 response.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::new(StatusCode::BAD_REQUEST, error).into_response()
}
