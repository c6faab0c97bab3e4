use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId};
use domain::{Order, OrderStatus, Product};
use tokio::sync::RwLock;

use crate::store::{InventoryLedger, OrderStore};
use crate::{LedgerError, Result};

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    deductions: HashSet<OrderId>,
}

/// In-memory ledger implementation.
///
/// Provides the same interface as the PostgreSQL implementation. The whole
/// ledger sits behind one `RwLock`; `commit_deduction` holds the write lock
/// across the stock check, the decrement, and the idempotency insert, which
/// makes the pair atomic with respect to concurrent callers.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock for a product, for test assertions.
    pub async fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        self.inner
            .read()
            .await
            .products
            .get(product_id)
            .map(|p| p.stock)
    }

    /// Returns the number of recorded deductions.
    pub async fn deduction_count(&self) -> usize {
        self.inner.read().await.deductions.len()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryLedger {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&order_id).cloned())
    }

    async fn finalize_order(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        if !order.status.can_finalize_to(status) {
            return Err(LedgerError::AlreadyFinal {
                order_id,
                status: order.status,
            });
        }

        order.status = status;
        Ok(())
    }
}

#[async_trait]
impl InventoryLedger for InMemoryLedger {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.products.contains_key(&product.id) {
            return Err(LedgerError::DuplicateProduct(product.id.clone()));
        }
        inner.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.get(product_id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<_> = self.inner.read().await.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(products)
    }

    async fn deduction_recorded(&self, operation_id: OrderId) -> Result<bool> {
        Ok(self.inner.read().await.deductions.contains(&operation_id))
    }

    async fn commit_deduction(
        &self,
        product_id: &ProductId,
        quantity: u32,
        operation_id: OrderId,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;

        if inner.deductions.contains(&operation_id) {
            return Err(LedgerError::AlreadyRecorded(operation_id));
        }

        let product = inner
            .products
            .get_mut(product_id)
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.clone()))?;

        if product.stock < quantity {
            return Err(LedgerError::InsufficientStock {
                product_id: product_id.clone(),
                available: product.stock,
                requested: quantity,
            });
        }

        product.stock -= quantity;
        inner.deductions.insert(operation_id);
        Ok(())
    }
}
