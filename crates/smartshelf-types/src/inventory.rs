//! Inventory items and stock accounting
//!
//! The watcher exclusively owns the item collection. Stock is mutated only by
//! sale events and successful restock completions. `capacity` is a display
//! bound: stock is compared against `threshold`, never clamped to capacity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an inventory item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new() -> Self {
        Self(format!("item_{}", Uuid::new_v4()))
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single stocked item watched by the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    /// Sale unit, e.g. "kg", "box", "pkt"
    pub unit: String,
    pub stock: u32,
    /// Crossing below this level makes the item eligible for a restock workflow
    pub threshold: u32,
    /// Display bound only; stock is not clamped to it
    pub capacity: u32,
}

impl InventoryItem {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        stock: u32,
        threshold: u32,
        capacity: u32,
    ) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            unit: unit.into(),
            stock,
            threshold,
            capacity,
        }
    }

    /// True when stock has crossed below the restock threshold
    pub fn is_low(&self) -> bool {
        self.stock < self.threshold
    }

    /// Decrement stock by one for a sale. No-op when already empty.
    ///
    /// Returns whether a unit was actually sold.
    pub fn record_sale(&mut self) -> bool {
        if self.stock > 0 {
            self.stock -= 1;
            true
        } else {
            false
        }
    }

    /// Credit a fulfilled restock. Not clamped to capacity.
    pub fn receive(&mut self, quantity: u32) {
        self.stock += quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_decrements_until_empty() {
        let mut item = InventoryItem::new("Basmati Rice", "kg", 2, 10, 50);
        assert!(item.record_sale());
        assert!(item.record_sale());
        assert_eq!(item.stock, 0);
        // Empty stock: sale is a no-op, never negative
        assert!(!item.record_sale());
        assert_eq!(item.stock, 0);
    }

    #[test]
    fn low_stock_is_strictly_below_threshold() {
        let mut item = InventoryItem::new("Lays Chips", "pkt", 10, 10, 50);
        assert!(!item.is_low());
        item.record_sale();
        assert!(item.is_low());
    }

    #[test]
    fn receive_exceeds_capacity_without_clamping() {
        let mut item = InventoryItem::new("Thums Up", "btl", 45, 12, 60);
        item.receive(50);
        assert_eq!(item.stock, 95);
    }
}
