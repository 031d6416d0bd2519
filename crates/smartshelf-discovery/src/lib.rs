//! SmartShelf Discovery - secondary supplier network for fallback sourcing
//!
//! When the primary payment-gated protocol fails, the watcher queries this
//! gateway for alternate suppliers and places a simplified single-round order
//! with one of them. There is no payment challenge on this channel: it models
//! a trusted alternate network, so placement succeeds unconditionally once an
//! eligible supplier is found. In this design the directory is static;
//! externally it would be a network query.

use serde::{Deserialize, Serialize};
use smartshelf_types::{Supplier, SupplierProtocol};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Errors that can occur while sourcing through the fallback network
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("No fallback supplier advertises {item} support")]
    Exhausted { item: String },
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Response to a fallback order placement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackReceipt {
    pub success: bool,
    pub order_id: String,
    pub estimated_delivery: String,
    pub message: String,
}

/// Gateway to the fallback supplier network
#[derive(Debug, Clone)]
pub struct DiscoveryGateway {
    directory: Vec<Supplier>,
}

impl Default for DiscoveryGateway {
    fn default() -> Self {
        Self::with_directory(vec![
            Supplier {
                id: "supplier-1".to_string(),
                name: "Premium Rice Distributors".to_string(),
                rating: 4.8,
                delivery_estimate: "2 hours".to_string(),
                supported_protocols: vec![
                    SupplierProtocol::PaymentGated,
                    SupplierProtocol::Fallback,
                ],
            },
            Supplier {
                id: "supplier-2".to_string(),
                name: "Local Farm Co-op".to_string(),
                rating: 4.5,
                delivery_estimate: "4 hours".to_string(),
                supported_protocols: vec![
                    SupplierProtocol::Fallback,
                    SupplierProtocol::Traditional,
                ],
            },
        ])
    }
}

impl DiscoveryGateway {
    pub fn with_directory(directory: Vec<Supplier>) -> Self {
        Self { directory }
    }

    /// An empty network, for exercising the exhausted path
    pub fn empty() -> Self {
        Self::with_directory(Vec::new())
    }

    /// Suppliers advertising the fallback protocol, best rating first
    pub fn discover(&self, item: &str, quantity: u32) -> Result<Vec<Supplier>> {
        let mut eligible: Vec<Supplier> = self
            .directory
            .iter()
            .filter(|s| s.supports(SupplierProtocol::Fallback))
            .cloned()
            .collect();

        if eligible.is_empty() {
            return Err(DiscoveryError::Exhausted {
                item: item.to_string(),
            });
        }

        eligible.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        info!(item, quantity, found = eligible.len(), "fallback suppliers discovered");
        Ok(eligible)
    }

    /// Single-round handshake with a discovered supplier
    pub async fn place_order(
        &self,
        supplier: &Supplier,
        item: &str,
        quantity: u32,
    ) -> FallbackReceipt {
        info!(supplier = %supplier.name, item, quantity, "fallback order placed");
        FallbackReceipt {
            success: true,
            order_id: format!("FBK-{}", Uuid::new_v4()),
            estimated_delivery: supplier.delivery_estimate.clone(),
            message: format!(
                "Order for {quantity} {item} placed via fallback network with {}",
                supplier.name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_filters_to_fallback_capable() {
        let gateway = DiscoveryGateway::default();
        let suppliers = gateway.discover("Rice", 50).unwrap();
        assert_eq!(suppliers.len(), 2);
        assert!(suppliers
            .iter()
            .all(|s| s.supports(SupplierProtocol::Fallback)));
        // Best rating first
        assert_eq!(suppliers[0].id, "supplier-1");
    }

    #[test]
    fn empty_network_is_exhausted() {
        let gateway = DiscoveryGateway::empty();
        let result = gateway.discover("Rice", 50);
        assert!(matches!(result, Err(DiscoveryError::Exhausted { .. })));
    }

    #[test]
    fn non_fallback_suppliers_are_excluded() {
        let gateway = DiscoveryGateway::with_directory(vec![Supplier {
            id: "supplier-3".to_string(),
            name: "Legacy Wholesale".to_string(),
            rating: 4.0,
            delivery_estimate: "1 day".to_string(),
            supported_protocols: vec![SupplierProtocol::Traditional],
        }]);
        assert!(matches!(
            gateway.discover("Rice", 50),
            Err(DiscoveryError::Exhausted { .. })
        ));
    }

    #[tokio::test]
    async fn placement_succeeds_with_order_id() {
        let gateway = DiscoveryGateway::default();
        let suppliers = gateway.discover("Rice", 50).unwrap();
        let receipt = gateway.place_order(&suppliers[0], "Rice", 50).await;
        assert!(receipt.success);
        assert!(receipt.order_id.starts_with("FBK-"));
        assert!(!receipt.order_id.is_empty());
    }
}
