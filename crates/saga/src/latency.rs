//! Injectable response-delay policies for fault injection.

use std::time::Duration;

use crate::deduction::DeductStock;

/// Strategy deciding whether a deduction response should be artificially
/// delayed after its transaction has committed.
///
/// Used to exercise caller-side timeout handling; a delay never affects
/// committed state, only when the response is observed. The handler skips
/// the policy entirely on the idempotent-replay path.
pub trait LatencyPolicy: Send + Sync {
    /// Returns the delay to apply to this request's response, if any.
    fn response_delay(&self, request: &DeductStock) -> Option<Duration>;
}

/// Policy that never delays. The production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl LatencyPolicy for NoDelay {
    fn response_delay(&self, _request: &DeductStock) -> Option<Duration> {
        None
    }
}

/// Delays the response when the requested quantity matches a trigger value.
///
/// The trigger is a caller-visible property of the request, so a test (or a
/// curious operator) can provoke a slow response deterministically.
#[derive(Debug, Clone, Copy)]
pub struct QuantityTriggeredDelay {
    /// Requests for exactly this quantity are delayed.
    pub trigger_quantity: u32,
    /// How long to hold the response.
    pub delay: Duration,
}

impl QuantityTriggeredDelay {
    /// Creates a new quantity-triggered delay policy.
    pub fn new(trigger_quantity: u32, delay: Duration) -> Self {
        Self {
            trigger_quantity,
            delay,
        }
    }
}

impl LatencyPolicy for QuantityTriggeredDelay {
    fn response_delay(&self, request: &DeductStock) -> Option<Duration> {
        (request.quantity == self.trigger_quantity).then_some(self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, ProductId};

    fn request(quantity: u32) -> DeductStock {
        DeductStock {
            product_id: ProductId::new("P-001"),
            quantity,
            operation_id: OrderId::new(),
        }
    }

    #[test]
    fn no_delay_never_delays() {
        assert_eq!(NoDelay.response_delay(&request(42)), None);
    }

    #[test]
    fn trigger_quantity_delays_only_exact_match() {
        let policy = QuantityTriggeredDelay::new(42, Duration::from_secs(5));
        assert_eq!(
            policy.response_delay(&request(42)),
            Some(Duration::from_secs(5))
        );
        assert_eq!(policy.response_delay(&request(41)), None);
        assert_eq!(policy.response_delay(&request(43)), None);
    }
}
