use common::{OrderId, ProductId};
use domain::OrderStatus;
use thiserror::Error;

/// Errors that can occur when interacting with the ledger.
///
/// Business rejections (`ProductNotFound`, `InsufficientStock`,
/// `AlreadyRecorded`, `AlreadyFinal`) are distinct variants from
/// infrastructure failures (`Database`, `Migration`); callers map the former
/// to order failures and propagate the latter unchanged.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Not enough stock to commit the requested decrement.
    #[error("Insufficient stock for {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// A deduction has already been recorded for this operation identifier.
    #[error("Deduction already recorded for order {0}")]
    AlreadyRecorded(OrderId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order has already reached a terminal state.
    #[error("Order {order_id} is already {status}")]
    AlreadyFinal {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// A product with this identifier already exists.
    #[error("Product already exists: {0}")]
    DuplicateProduct(ProductId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A persisted value could not be decoded.
    #[error("Corrupt ledger row: {0}")]
    Corrupt(String),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
