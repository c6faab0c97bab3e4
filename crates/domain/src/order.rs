//! Order record and its lifecycle state machine.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The state of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Confirmed
///           └──► Failed
/// ```
/// `Confirmed` and `Failed` are terminal. There is no transition out of a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created, inventory deduction outcome not yet known.
    #[default]
    Pending,

    /// Inventory deducted, order confirmed (terminal state).
    Confirmed,

    /// Deduction rejected or timed out (terminal state).
    Failed,
}

impl OrderStatus {
    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Failed)
    }

    /// Returns true if the order can be finalized to the given status.
    ///
    /// Only `Pending → Confirmed` and `Pending → Failed` are legal.
    pub fn can_finalize_to(&self, next: OrderStatus) -> bool {
        matches!(self, OrderStatus::Pending) && next.is_terminal()
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Error)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "FAILED" => Ok(OrderStatus::Failed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A single-product order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier, also the idempotency key for the deduction.
    pub id: OrderId,

    /// The product being ordered.
    pub product_id: ProductId,

    /// Requested quantity (always positive).
    pub quantity: u32,

    /// Lifecycle status.
    pub status: OrderStatus,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order with a fresh identifier.
    pub fn pending(product_id: ProductId, quantity: u32) -> Self {
        Self {
            id: OrderId::new(),
            product_id,
            quantity,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
