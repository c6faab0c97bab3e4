//! Saga error types.

use std::time::Duration;

use common::{OrderId, ProductId};
use ledger::LedgerError;
use thiserror::Error;

/// Errors returned by the deduction handler.
#[derive(Debug, Error)]
pub enum DeductionError {
    /// Malformed input; rejected before any side effect.
    #[error("Invalid deduction request: {0}")]
    InvalidRequest(String),

    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Not enough stock to satisfy the request.
    #[error("Insufficient stock for {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// Infrastructure failure in the ledger; not a business rejection.
    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for DeductionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ProductNotFound(id) => DeductionError::ProductNotFound(id),
            LedgerError::InsufficientStock {
                product_id,
                available,
                requested,
            } => DeductionError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            other => DeductionError::Ledger(other),
        }
    }
}

/// Why a placed order ended in the FAILED state.
#[derive(Debug, Error)]
pub enum FailureReason {
    /// The coordinator's deadline expired before the handler answered. The
    /// inventory-side outcome is unknown: the deduction may have committed.
    #[error("inventory deduction timed out after {0:?}; remote outcome unknown")]
    Timeout(Duration),

    /// The handler rejected the deduction.
    #[error(transparent)]
    Deduction(DeductionError),

    /// The deduction call ended without producing an outcome.
    #[error("deduction call aborted: {0}")]
    Aborted(String),
}

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Malformed input; rejected before any order record is written.
    #[error("Invalid order request: {0}")]
    InvalidRequest(String),

    /// The order reached the FAILED state. Carries the order identifier so
    /// the caller can reconcile or retry with the same idempotency key.
    #[error("Order {order_id} failed: {reason}")]
    OrderFailed {
        order_id: OrderId,
        reason: FailureReason,
    },

    /// Ledger/infrastructure error outside the deduction call.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
