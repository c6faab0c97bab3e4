use async_trait::async_trait;
use common::{OrderId, ProductId};
use domain::{Order, OrderStatus, Product};

use crate::Result;

/// Durable store for order records.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order. The order is expected to be in `Pending` state.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Loads an order by ID. Returns None if it doesn't exist.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Moves a pending order to a terminal state.
    ///
    /// Fails with `AlreadyFinal` if the order has already reached a terminal
    /// state, and with `OrderNotFound` if it does not exist. Terminal states
    /// are final: this is the only status write after insertion.
    async fn finalize_order(&self, order_id: OrderId, status: OrderStatus) -> Result<()>;
}

/// Durable store for product stock and the idempotency ledger.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Persists a new product.
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Loads a product by ID. Returns None if it doesn't exist.
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Lists all products.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Returns true if a deduction has been recorded for this operation.
    ///
    /// A recorded entry implies the matching stock decrement committed
    /// exactly once.
    async fn deduction_recorded(&self, operation_id: OrderId) -> Result<bool>;

    /// Atomically checks-and-decrements the product's stock and records the
    /// idempotency entry for `operation_id`.
    ///
    /// The decrement and the record are one transaction: either both are
    /// committed or neither is. Fails with `InsufficientStock` if the
    /// decrement would go negative, `ProductNotFound` if the product does
    /// not exist, and `AlreadyRecorded` if an entry for `operation_id`
    /// already exists; in all failure cases no state changes.
    async fn commit_deduction(
        &self,
        product_id: &ProductId,
        quantity: u32,
        operation_id: OrderId,
    ) -> Result<()>;
}
