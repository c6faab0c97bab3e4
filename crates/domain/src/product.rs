//! Product stock row.

use common::ProductId;
use serde::{Deserialize, Serialize};

/// A product with its remaining stock count.
///
/// The stock count never goes negative: it is a `u32` here, and the
/// persistence layer only commits a decrement when enough stock remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (SKU).
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Remaining stock count.
    pub stock: u32,
}

impl Product {
    /// Creates a new product.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, stock: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stock,
        }
    }

    /// Returns true if at least `quantity` units remain.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_stock_checks_boundary() {
        let product = Product::new("P-001", "Widget", 3);
        assert!(product.has_stock(3));
        assert!(!product.has_stock(4));
    }

    #[test]
    fn zero_stock_rejects_any_quantity() {
        let product = Product::new("P-001", "Widget", 0);
        assert!(!product.has_stock(1));
        assert!(product.has_stock(0));
    }

    #[test]
    fn serialization_roundtrip() {
        let product = Product::new("P-001", "Widget", 100);
        let json = serde_json::to_string(&product).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(product, back);
    }
}
