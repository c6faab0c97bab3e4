//! Order-placement saga for the stock-saga system.
//!
//! Two halves of a two-party distributed transaction:
//! - the [`DeductionHandler`] applies a stock deduction at most once per
//!   operation identifier (idempotent under at-least-once delivery);
//! - the [`OrderCoordinator`] creates a pending order, calls the handler
//!   under a bounded deadline, and reconciles the order to a terminal state.
//!
//! The coordinator never retries; a caller retrying with the same order
//! identifier is safe because the handler short-circuits replays.

pub mod coordinator;
pub mod deduction;
pub mod error;
pub mod latency;

pub use coordinator::OrderCoordinator;
pub use deduction::{DeductOutcome, DeductStock, DeductionHandler, DeductionService};
pub use error::{DeductionError, FailureReason, SagaError};
pub use latency::{LatencyPolicy, NoDelay, QuantityTriggeredDelay};
