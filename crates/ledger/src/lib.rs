//! Persistence layer for orders, product stock, and the idempotency ledger.
//!
//! Two implementations share the same traits: [`InMemoryLedger`] for tests
//! and local runs, and [`PostgresLedger`] backed by sqlx. The critical
//! contract is [`InventoryLedger::commit_deduction`]: the stock decrement
//! and the idempotency record are written as one atomic unit, so a crash
//! between the two can never leave a decrement without a record or a record
//! without a decrement.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{OrderId, ProductId};
pub use error::{LedgerError, Result};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use store::{InventoryLedger, OrderStore};
