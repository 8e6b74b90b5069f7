//! Domain types read by the adapter

use serde::{Deserialize, Serialize};

/// Order as owned by the order domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: i64,
    /// Line items, in order
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Order line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product code (decimal digits expected, not enforced)
    pub product_code: String,
    /// Quantity
    pub quantity: u32,
}

impl Order {
    /// Create an order
    pub fn new(id: i64, items: Vec<OrderItem>) -> Self {
        Self { id, items }
    }

    /// Total units across all items
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

impl OrderItem {
    /// Create a line item
    pub fn new(product_code: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
        }
    }
}
