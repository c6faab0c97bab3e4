//! Order saga coordinator: pending order, bounded deduction call, terminal
//! reconciliation.

use std::sync::Arc;
use std::time::Duration;

use common::{OrderId, ProductId};
use domain::{Order, OrderStatus};
use ledger::OrderStore;

use crate::deduction::{DeductOutcome, DeductStock, DeductionService};
use crate::error::{FailureReason, SagaError};

/// Coordinates the order-placement saga.
///
/// One saga attempt per call: create the order PENDING, invoke the deduction
/// handler once under the configured deadline, and write the order's
/// terminal state from the outcome. The coordinator performs no retries;
/// retry belongs to the caller, made safe by the handler's idempotency on
/// the order identifier.
pub struct OrderCoordinator<S, D>
where
    S: OrderStore,
    D: DeductionService + 'static,
{
    orders: S,
    deduction: Arc<D>,
    deadline: Duration,
}

impl<S, D> OrderCoordinator<S, D>
where
    S: OrderStore,
    D: DeductionService + 'static,
{
    /// Creates a new coordinator with the given wait budget for the
    /// deduction call.
    pub fn new(orders: S, deduction: Arc<D>, deadline: Duration) -> Self {
        Self {
            orders,
            deduction,
            deadline,
        }
    }

    /// Returns the configured wait budget.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Places an order for `quantity` units of `product_id`.
    ///
    /// Returns the CONFIRMED order on success. Every failure after the
    /// pending write surfaces as [`SagaError::OrderFailed`] carrying the
    /// order identifier, so the caller can correlate and retry with the
    /// same idempotency key.
    #[tracing::instrument(skip(self))]
    pub async fn place_order(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Order, SagaError> {
        metrics::counter!("order_attempts_total").increment(1);
        let attempt_start = std::time::Instant::now();

        // 1. Validate before any write.
        if product_id.is_empty() {
            return Err(SagaError::InvalidRequest(
                "product_id must not be empty".to_string(),
            ));
        }
        if quantity == 0 {
            return Err(SagaError::InvalidRequest(
                "quantity must be positive".to_string(),
            ));
        }

        // 2. The pending write must land first: the order id is the
        // idempotency key for the deduction.
        let order = Order::pending(product_id.clone(), quantity);
        self.orders.insert_order(&order).await?;

        // 3. One deduction call, spawned so the deadline abandons it
        // rather than cancelling it: the handler may still commit after we
        // stop waiting.
        let request = DeductStock {
            product_id,
            quantity,
            operation_id: order.id,
        };
        let service = Arc::clone(&self.deduction);
        let call = tokio::spawn(async move { service.deduct(request).await });

        let outcome = match tokio::time::timeout(self.deadline, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => {
                let reason = FailureReason::Aborted(join_err.to_string());
                return Err(self.fail(order.id, reason, attempt_start, "aborted").await);
            }
            Err(_elapsed) => {
                // Deadline fired. The in-flight call keeps running and may
                // have already decremented stock; the order is marked
                // FAILED here regardless, and the divergence is left to
                // out-of-band reconciliation.
                let reason = FailureReason::Timeout(self.deadline);
                return Err(self.fail(order.id, reason, attempt_start, "timeout").await);
            }
        };

        match outcome {
            Ok(DeductOutcome::Deducted) | Ok(DeductOutcome::AlreadyDeducted) => {
                self.orders
                    .finalize_order(order.id, OrderStatus::Confirmed)
                    .await?;

                let duration = attempt_start.elapsed().as_secs_f64();
                metrics::histogram!("order_placement_duration_seconds").record(duration);
                metrics::counter!("orders_total", "outcome" => "confirmed").increment(1);
                tracing::info!(order_id = %order.id, duration, "order confirmed");

                Ok(Order {
                    status: OrderStatus::Confirmed,
                    ..order
                })
            }
            Err(err) => {
                let reason = FailureReason::Deduction(err);
                Err(self.fail(order.id, reason, attempt_start, "rejected").await)
            }
        }
    }

    /// Loads an order by ID, for out-of-band reconciliation.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, SagaError> {
        Ok(self.orders.get_order(order_id).await?)
    }

    /// Writes the terminal FAILED state and builds the surfaced error.
    ///
    /// A ledger failure during the terminal write is an infrastructure
    /// error and takes precedence over the business failure.
    async fn fail(
        &self,
        order_id: OrderId,
        reason: FailureReason,
        attempt_start: std::time::Instant,
        outcome: &'static str,
    ) -> SagaError {
        if let Err(e) = self
            .orders
            .finalize_order(order_id, OrderStatus::Failed)
            .await
        {
            return SagaError::Ledger(e);
        }

        let duration = attempt_start.elapsed().as_secs_f64();
        metrics::histogram!("order_placement_duration_seconds").record(duration);
        metrics::counter!("orders_total", "outcome" => outcome).increment(1);
        tracing::warn!(%order_id, %reason, duration, "order failed");

        SagaError::OrderFailed { order_id, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduction::DeductionHandler;
    use crate::latency::{NoDelay, QuantityTriggeredDelay};
    use domain::Product;
    use ledger::{InMemoryLedger, InventoryLedger};

    const DEADLINE: Duration = Duration::from_millis(500);

    async fn setup(
        stock: u32,
        latency: Arc<dyn crate::LatencyPolicy>,
    ) -> (
        OrderCoordinator<InMemoryLedger, DeductionHandler<InMemoryLedger>>,
        Arc<DeductionHandler<InMemoryLedger>>,
        InMemoryLedger,
    ) {
        let ledger = InMemoryLedger::new();
        ledger
            .insert_product(&Product::new("P-001", "Widget", stock))
            .await
            .unwrap();
        let handler = Arc::new(DeductionHandler::new(ledger.clone(), latency));
        let coordinator = OrderCoordinator::new(ledger.clone(), Arc::clone(&handler), DEADLINE);
        (coordinator, handler, ledger)
    }

    #[tokio::test]
    async fn happy_path_confirms_and_decrements() {
        let (coordinator, _, ledger) = setup(100, Arc::new(NoDelay)).await;

        let order = coordinator
            .place_order(ProductId::new("P-001"), 1)
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(99));

        let stored = ledger.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn insufficient_stock_fails_order_with_reason() {
        let (coordinator, _, ledger) = setup(0, Arc::new(NoDelay)).await;

        let err = coordinator
            .place_order(ProductId::new("P-001"), 1)
            .await
            .unwrap_err();

        let SagaError::OrderFailed { order_id, reason } = err else {
            panic!("expected OrderFailed, got {err}");
        };
        assert!(matches!(
            reason,
            FailureReason::Deduction(crate::DeductionError::InsufficientStock { .. })
        ));

        // Terminal state written, stock untouched.
        let stored = ledger.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Failed);
        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(0));
    }

    #[tokio::test]
    async fn unknown_product_fails_order() {
        let (coordinator, _, ledger) = setup(10, Arc::new(NoDelay)).await;

        let err = coordinator
            .place_order(ProductId::new("P-404"), 1)
            .await
            .unwrap_err();

        let SagaError::OrderFailed { order_id, reason } = err else {
            panic!("expected OrderFailed, got {err}");
        };
        assert!(matches!(
            reason,
            FailureReason::Deduction(crate::DeductionError::ProductNotFound(_))
        ));
        let stored = ledger.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Failed);
    }

    #[tokio::test]
    async fn invalid_request_creates_no_order() {
        let (coordinator, _, ledger) = setup(10, Arc::new(NoDelay)).await;

        let err = coordinator
            .place_order(ProductId::new("P-001"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, SagaError::InvalidRequest(_)));

        let err = coordinator.place_order(ProductId::new(""), 1).await.unwrap_err();
        assert!(matches!(err, SagaError::InvalidRequest(_)));

        assert_eq!(ledger.order_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_fails_order_with_timeout_reason() {
        // Delay longer than the coordinator's deadline.
        let policy = QuantityTriggeredDelay::new(2, Duration::from_secs(5));
        let (coordinator, _, ledger) = setup(10, Arc::new(policy)).await;

        let err = coordinator
            .place_order(ProductId::new("P-001"), 2)
            .await
            .unwrap_err();

        let SagaError::OrderFailed { order_id, reason } = err else {
            panic!("expected OrderFailed, got {err}");
        };
        assert!(matches!(reason, FailureReason::Timeout(d) if d == DEADLINE));

        let stored = ledger.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_deduction_still_committed_on_inventory_side() {
        let policy = QuantityTriggeredDelay::new(2, Duration::from_secs(5));
        let (coordinator, handler, ledger) = setup(10, Arc::new(policy)).await;

        let err = coordinator
            .place_order(ProductId::new("P-001"), 2)
            .await
            .unwrap_err();
        let SagaError::OrderFailed { order_id, .. } = err else {
            panic!("expected OrderFailed, got {err}");
        };

        // The abandoned call committed before its injected delay: local
        // FAILED state diverges from remote stock. This divergence is
        // accepted and left to out-of-band reconciliation.
        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(8));
        assert!(ledger.deduction_recorded(order_id).await.unwrap());

        // A direct retry with the same order id observes the replay and
        // deducts nothing further.
        let outcome = handler
            .deduct(DeductStock {
                product_id: ProductId::new("P-001"),
                quantity: 2,
                operation_id: order_id,
            })
            .await
            .unwrap();
        assert_eq!(outcome, DeductOutcome::AlreadyDeducted);
        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(8));
    }

    #[tokio::test]
    async fn orders_on_different_products_are_independent() {
        let ledger = InMemoryLedger::new();
        ledger
            .insert_product(&Product::new("P-001", "Widget", 5))
            .await
            .unwrap();
        ledger
            .insert_product(&Product::new("P-002", "Gadget", 5))
            .await
            .unwrap();
        let handler = Arc::new(DeductionHandler::new(ledger.clone(), Arc::new(NoDelay)));
        let coordinator =
            Arc::new(OrderCoordinator::new(ledger.clone(), handler, DEADLINE));

        let mut handles = Vec::new();
        for product in ["P-001", "P-002"] {
            for _ in 0..5 {
                let coordinator = Arc::clone(&coordinator);
                let product_id = ProductId::new(product);
                handles.push(tokio::spawn(async move {
                    coordinator.place_order(product_id, 1).await
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger.stock_of(&ProductId::new("P-001")).await, Some(0));
        assert_eq!(ledger.stock_of(&ProductId::new("P-002")).await, Some(0));
    }

    #[tokio::test]
    async fn get_order_returns_none_for_unknown_id() {
        let (coordinator, _, _) = setup(1, Arc::new(NoDelay)).await;
        let result = coordinator.get_order(OrderId::new()).await.unwrap();
        assert!(result.is_none());
    }
}
