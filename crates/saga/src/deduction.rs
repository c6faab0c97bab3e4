//! Inventory deduction handler: exactly-once stock effects under
//! at-least-once delivery.

use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId};
use ledger::{InventoryLedger, LedgerError};

use crate::error::DeductionError;
use crate::latency::LatencyPolicy;

/// A request to deduct stock, keyed by the order's identifier.
#[derive(Debug, Clone)]
pub struct DeductStock {
    /// The product to deduct from.
    pub product_id: ProductId,
    /// Quantity to deduct (must be positive).
    pub quantity: u32,
    /// Idempotency key: the order this deduction fulfils.
    pub operation_id: OrderId,
}

/// Outcome of a successful deduction call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeductOutcome {
    /// Stock was deducted by this call.
    Deducted,
    /// A previous delivery of this operation already deducted the stock;
    /// nothing changed.
    AlreadyDeducted,
}

/// Trait for the inventory side of the order-placement saga.
///
/// Callers may retry freely with the same `operation_id`; only the first
/// delivery mutates stock.
#[async_trait]
pub trait DeductionService: Send + Sync {
    /// Deducts stock for the given request, at most once per operation.
    async fn deduct(&self, request: DeductStock) -> Result<DeductOutcome, DeductionError>;
}

/// Inventory deduction handler.
///
/// Orchestrates the idempotency lookup, the atomic decrement-plus-record
/// transaction, and the injected response delay. This is the trust boundary
/// for exactly-once stock effects: duplicate deliveries are answered from
/// the idempotency ledger without touching stock.
pub struct DeductionHandler<L> {
    ledger: L,
    latency: Arc<dyn LatencyPolicy>,
}

impl<L: InventoryLedger> DeductionHandler<L> {
    /// Creates a new handler over the given ledger and latency policy.
    pub fn new(ledger: L, latency: Arc<dyn LatencyPolicy>) -> Self {
        Self { ledger, latency }
    }

    fn validate(request: &DeductStock) -> Result<(), DeductionError> {
        if request.product_id.is_empty() {
            return Err(DeductionError::InvalidRequest(
                "product_id must not be empty".to_string(),
            ));
        }
        if request.quantity == 0 {
            return Err(DeductionError::InvalidRequest(
                "quantity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<L: InventoryLedger> DeductionService for DeductionHandler<L> {
    #[tracing::instrument(skip(self), fields(operation_id = %request.operation_id))]
    async fn deduct(&self, request: DeductStock) -> Result<DeductOutcome, DeductionError> {
        Self::validate(&request)?;

        // Replay fast path: answer from the idempotency ledger without
        // touching stock or the latency policy, so retries stay cheap.
        if self
            .ledger
            .deduction_recorded(request.operation_id)
            .await
            .map_err(DeductionError::from)?
        {
            metrics::counter!("stock_deduction_replays_total").increment(1);
            tracing::info!(order_id = %request.operation_id, "deduction replay short-circuited");
            return Ok(DeductOutcome::AlreadyDeducted);
        }

        match self
            .ledger
            .commit_deduction(&request.product_id, request.quantity, request.operation_id)
            .await
        {
            Ok(()) => {}
            // A duplicate delivery raced past the lookup; the winner's
            // transaction committed the decrement exactly once.
            Err(LedgerError::AlreadyRecorded(_)) => {
                metrics::counter!("stock_deduction_replays_total").increment(1);
                return Ok(DeductOutcome::AlreadyDeducted);
            }
            Err(e) => return Err(e.into()),
        }

        metrics::counter!("stock_deductions_total").increment(1);

        // Fault injection: hold the response after the commit so callers
        // can exercise their timeout handling.
        if let Some(delay) = self.latency.response_delay(&request) {
            tracing::warn!(?delay, order_id = %request.operation_id, "delaying deduction response");
            tokio::time::sleep(delay).await;
        }

        Ok(DeductOutcome::Deducted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latency::{NoDelay, QuantityTriggeredDelay};
    use domain::Product;
    use ledger::InMemoryLedger;
    use std::time::Duration;

    async fn handler_with_stock(stock: u32) -> (DeductionHandler<InMemoryLedger>, InMemoryLedger) {
        let ledger = InMemoryLedger::new();
        ledger
            .insert_product(&Product::new("P-001", "Widget", stock))
            .await
            .unwrap();
        let handler = DeductionHandler::new(ledger.clone(), Arc::new(NoDelay));
        (handler, ledger)
    }

    fn request(quantity: u32, operation_id: OrderId) -> DeductStock {
        DeductStock {
            product_id: ProductId::new("P-001"),
            quantity,
            operation_id,
        }
    }

    #[tokio::test]
    async fn first_delivery_deducts() {
        let (handler, ledger) = handler_with_stock(100).await;
        let op = OrderId::new();

        let outcome = handler.deduct(request(1, op)).await.unwrap();

        assert_eq!(outcome, DeductOutcome::Deducted);
        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(99));
    }

    #[tokio::test]
    async fn replays_deduct_exactly_once() {
        let (handler, ledger) = handler_with_stock(100).await;
        let op = OrderId::new();

        assert_eq!(
            handler.deduct(request(1, op)).await.unwrap(),
            DeductOutcome::Deducted
        );
        for _ in 0..4 {
            assert_eq!(
                handler.deduct(request(1, op)).await.unwrap(),
                DeductOutcome::AlreadyDeducted
            );
        }

        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(99));
        assert_eq!(ledger.deduction_count().await, 1);
    }

    #[tokio::test]
    async fn insufficient_stock_has_no_side_effect() {
        let (handler, ledger) = handler_with_stock(2).await;
        let op = OrderId::new();

        let result = handler.deduct(request(3, op)).await;

        assert!(matches!(
            result,
            Err(DeductionError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));
        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(2));
        assert_eq!(ledger.deduction_count().await, 0);

        // A later retry with the same id may still succeed.
        let outcome = handler.deduct(request(2, op)).await.unwrap();
        assert_eq!(outcome, DeductOutcome::Deducted);
        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(0));
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let (handler, _) = handler_with_stock(10).await;
        let result = handler
            .deduct(DeductStock {
                product_id: ProductId::new("P-404"),
                quantity: 1,
                operation_id: OrderId::new(),
            })
            .await;
        assert!(matches!(result, Err(DeductionError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn zero_quantity_is_invalid_with_no_side_effects() {
        let (handler, ledger) = handler_with_stock(10).await;
        let op = OrderId::new();

        let result = handler.deduct(request(0, op)).await;

        assert!(matches!(result, Err(DeductionError::InvalidRequest(_))));
        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(10));
        assert!(!ledger.deduction_recorded(op).await.unwrap());
    }

    #[tokio::test]
    async fn empty_product_id_is_invalid() {
        let (handler, _) = handler_with_stock(10).await;
        let result = handler
            .deduct(DeductStock {
                product_id: ProductId::new(""),
                quantity: 1,
                operation_id: OrderId::new(),
            })
            .await;
        assert!(matches!(result, Err(DeductionError::InvalidRequest(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn replay_path_skips_injected_delay() {
        let ledger = InMemoryLedger::new();
        ledger
            .insert_product(&Product::new("P-001", "Widget", 10))
            .await
            .unwrap();
        let handler = DeductionHandler::new(
            ledger.clone(),
            Arc::new(QuantityTriggeredDelay::new(2, Duration::from_secs(5))),
        );
        let op = OrderId::new();

        // First delivery pays the injected delay (auto-advanced here).
        let start = tokio::time::Instant::now();
        handler.deduct(request(2, op)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));

        // The replay answers immediately.
        let start = tokio::time::Instant::now();
        let outcome = handler.deduct(request(2, op)).await.unwrap();
        assert_eq!(outcome, DeductOutcome::AlreadyDeducted);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_applies_after_commit() {
        let ledger = InMemoryLedger::new();
        ledger
            .insert_product(&Product::new("P-001", "Widget", 10))
            .await
            .unwrap();
        let handler = Arc::new(DeductionHandler::new(
            ledger.clone(),
            Arc::new(QuantityTriggeredDelay::new(2, Duration::from_secs(5))),
        ));
        let op = OrderId::new();

        let call = tokio::spawn({
            let handler = Arc::clone(&handler);
            async move { handler.deduct(request(2, op)).await }
        });

        // Let the call reach its sleep; stock is already committed.
        tokio::task::yield_now().await;
        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(8));
        assert!(ledger.deduction_recorded(op).await.unwrap());

        let outcome = call.await.unwrap().unwrap();
        assert_eq!(outcome, DeductOutcome::Deducted);
    }
}
