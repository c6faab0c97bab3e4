//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ledger::LedgerError;
use saga::{DeductionError, SagaError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Stock deduction error.
    Deduction(DeductionError),
    /// Order saga error.
    Saga(SagaError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The FAILED order carries its identifier so the client can retry
        // with the same idempotency key; everything else is a flat
        // `{ "error": ... }` body.
        if let ApiError::Saga(SagaError::OrderFailed { order_id, reason }) = &self {
            let body = serde_json::json!({
                "error": reason.to_string(),
                "order_id": order_id.to_string(),
                "status": "FAILED",
            });
            return (StatusCode::SERVICE_UNAVAILABLE, axum::Json(body)).into_response();
        }

        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Deduction(err) => deduction_error_to_response(err),
            ApiError::Saga(err) => saga_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn deduction_error_to_response(err: DeductionError) -> (StatusCode, String) {
    match &err {
        DeductionError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DeductionError::ProductNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DeductionError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        DeductionError::Ledger(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        // OrderFailed is handled above; this arm is unreachable in practice.
        SagaError::OrderFailed { .. } => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        SagaError::Ledger(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<DeductionError> for ApiError {
    fn from(err: DeductionError) -> Self {
        ApiError::Deduction(err)
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ProductNotFound(id) => ApiError::NotFound(format!("Product {id} not found")),
            LedgerError::OrderNotFound(id) => ApiError::NotFound(format!("Order {id} not found")),
            LedgerError::DuplicateProduct(id) => {
                ApiError::BadRequest(format!("Product {id} already exists"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
