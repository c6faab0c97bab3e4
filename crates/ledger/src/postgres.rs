use std::str::FromStr;

use async_trait::async_trait;
use common::{OrderId, ProductId};
use domain::{Order, OrderStatus, Product};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::store::{InventoryLedger, OrderStore};
use crate::{LedgerError, Result};

/// PostgreSQL-backed ledger implementation.
///
/// `commit_deduction` runs as a single SQL transaction: the idempotency
/// insert and the conditional stock decrement either both commit or both
/// roll back. Concurrent decrements on the same product serialize on the
/// row lock; different products do not block each other.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status_str: String = row.try_get("status")?;
        let status = OrderStatus::from_str(&status_str)
            .map_err(|e| LedgerError::Corrupt(e.to_string()))?;
        let quantity: i64 = row.try_get("quantity")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            quantity: quantity as u32,
            status,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let stock: i64 = row.try_get("stock")?;
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            stock: stock as u32,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresLedger {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, product_id, quantity, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.product_id.as_str())
        .bind(order.quantity as i64)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            "SELECT id, product_id, quantity, status, created_at FROM orders WHERE id = $1",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn finalize_order(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1 AND status = $3")
            .bind(order_id.as_uuid())
            .bind(status.as_str())
            .bind(OrderStatus::Pending.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing order from one already finalized.
            tracing::debug!(%order_id, "conditional status update matched no pending row");
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
                    .bind(order_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await?;

            return Err(match current {
                None => LedgerError::OrderNotFound(order_id),
                Some(s) => LedgerError::AlreadyFinal {
                    order_id,
                    status: OrderStatus::from_str(&s)
                        .map_err(|e| LedgerError::Corrupt(e.to_string()))?,
                },
            });
        }

        Ok(())
    }
}

#[async_trait]
impl InventoryLedger for PostgresLedger {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query("INSERT INTO products (id, name, stock) VALUES ($1, $2, $3)")
            .bind(product.id.as_str())
            .bind(&product.name)
            .bind(product.stock as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return LedgerError::DuplicateProduct(product.id.clone());
                }
                LedgerError::Database(e)
            })?;

        Ok(())
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT id, name, stock FROM products WHERE id = $1")
            .bind(product_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, stock FROM products ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn deduction_recorded(&self, operation_id: OrderId) -> Result<bool> {
        let found: Option<Uuid> =
            sqlx::query_scalar("SELECT order_id FROM stock_deductions WHERE order_id = $1")
                .bind(operation_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.is_some())
    }

    async fn commit_deduction(
        &self,
        product_id: &ProductId,
        quantity: u32,
        operation_id: OrderId,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Idempotency record first: the primary key turns a duplicate
        // delivery race into a constraint violation, aborting the whole
        // transaction before any stock change.
        sqlx::query("INSERT INTO stock_deductions (order_id) VALUES ($1)")
            .bind(operation_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return LedgerError::AlreadyRecorded(operation_id);
                }
                LedgerError::Database(e)
            })?;

        let result =
            sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
                .bind(product_id.as_str())
                .bind(quantity as i64)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            // Dropping tx rolls back the idempotency insert.
            let available: Option<i64> =
                sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                    .bind(product_id.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match available {
                None => LedgerError::ProductNotFound(product_id.clone()),
                Some(available) => LedgerError::InsufficientStock {
                    product_id: product_id.clone(),
                    available: available as u32,
                    requested: quantity,
                },
            });
        }

        tx.commit().await?;
        tracing::debug!(%product_id, quantity, operation_id = %operation_id, "deduction committed");
        Ok(())
    }
}
