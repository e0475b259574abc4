//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::WorkflowError;
use domain::returns::ReturnError;
use domain::shipment::ShipmentError;
use ledger::LedgerError;
use reconciliation::ReconciliationError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Workflow logic error.
    Workflow(WorkflowError),
    /// Reconciliation scan error.
    Reconciliation(ReconciliationError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Workflow(err) => workflow_error_to_response(err),
            ApiError::Reconciliation(err) => {
                tracing::error!(error = %err, "reconciliation scan failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn workflow_error_to_response(err: WorkflowError) -> (StatusCode, String) {
    match &err {
        WorkflowError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        WorkflowError::ConstraintViolation(_) => (StatusCode::CONFLICT, err.to_string()),
        WorkflowError::Shipment(shipment_err) => match shipment_err {
            ShipmentError::InvalidStateTransition { .. }
            | ShipmentError::AlreadyCreated
            | ShipmentError::NotCreated => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        WorkflowError::Return(return_err) => match return_err {
            ReturnError::InvalidTransition { .. }
            | ReturnError::InvalidStateTransition { .. }
            | ReturnError::RefundNotInProgress { .. }
            | ReturnError::UnsupportedResolution { .. }
            | ReturnError::RefundAmountMismatch { .. }
            | ReturnError::DeductionReasonRequired
            | ReturnError::AlreadyCreated
            | ReturnError::NotCreated => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        WorkflowError::Ledger(LedgerError::ConcurrencyConflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError::Workflow(err)
    }
}

impl From<ReconciliationError> for ApiError {
    fn from(err: ReconciliationError) -> Self {
        ApiError::Reconciliation(err)
    }
}
