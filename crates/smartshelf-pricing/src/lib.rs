//! SmartShelf Pricing - unit pricing from time-of-day and quantity rules
//!
//! `quote` is a pure function of `(quantity, hour)`: identical inputs always
//! yield the identical price. The price is not pinned to any particular
//! request here; pinning issued invoices is the ledger's invoice store's job.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Pricing rule configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Base unit price in the settlement currency
    pub base_price: Decimal,
    /// Flat surcharge applied during the late-day window
    pub surge_amount: Decimal,
    /// Local hour (0-23) at which the surge window opens; it runs to midnight
    pub surge_start_hour: u32,
    /// Order quantities strictly above this earn the bulk discount
    pub bulk_threshold: u32,
    /// Flat discount for bulk orders
    pub bulk_discount: Decimal,
    /// Fixed decimal precision of quoted prices
    pub scale: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_price: dec!(0.0001),
            surge_amount: dec!(0.00002),
            surge_start_hour: 17,
            bulk_threshold: 100,
            bulk_discount: dec!(0.00001),
            scale: 6,
        }
    }
}

/// Computes the current price for an order request
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Quote a price for `quantity` units at local `hour`.
    ///
    /// `price = base + surge(hour) + bulk_discount(quantity)`, rounded and
    /// rescaled to the configured fixed precision.
    pub fn quote(&self, quantity: u32, hour: u32) -> Decimal {
        let surge = if hour >= self.config.surge_start_hour {
            self.config.surge_amount
        } else {
            Decimal::ZERO
        };
        let discount = if quantity > self.config.bulk_threshold {
            self.config.bulk_discount
        } else {
            Decimal::ZERO
        };

        let mut price = (self.config.base_price + surge - discount).round_dp(self.config.scale);
        price.rescale(self.config.scale);
        price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_is_pure() {
        let engine = PricingEngine::default();
        let a = engine.quote(20, 9);
        let b = engine.quote(20, 9);
        assert_eq!(a, b);
    }

    #[test]
    fn off_peak_small_order_is_base_price() {
        let engine = PricingEngine::default();
        assert_eq!(engine.quote(20, 9).to_string(), "0.000100");
    }

    #[test]
    fn surge_window_adds_surcharge() {
        let engine = PricingEngine::default();
        assert_eq!(engine.quote(20, 17), dec!(0.00012));
        assert_eq!(engine.quote(20, 23), dec!(0.00012));
        assert_eq!(engine.quote(20, 16), dec!(0.0001));
    }

    #[test]
    fn bulk_order_earns_discount() {
        let engine = PricingEngine::default();
        // Strictly above the threshold
        assert_eq!(engine.quote(100, 9), dec!(0.0001));
        assert_eq!(engine.quote(101, 9), dec!(0.00009));
    }

    #[test]
    fn surge_and_bulk_combine() {
        let engine = PricingEngine::default();
        // base + surge - bulk discount
        let price = engine.quote(150, 18);
        assert_eq!(price, dec!(0.00011));
        assert_ne!(price, engine.quote(20, 9));
    }
}
