//! Shared identifier types used across the stock-saga crates.

pub mod types;

pub use types::{OrderId, ProductId};
