//! Domain layer for the stock-saga system.
//!
//! Plain data types shared by the coordinator, deduction handler, and the
//! persistence layer: the `Order` record with its terminal-state machine,
//! and the `Product` stock row.

pub mod order;
pub mod product;

pub use common::{OrderId, ProductId};
pub use order::{Order, OrderStatus, ParseStatusError};
pub use product::Product;
