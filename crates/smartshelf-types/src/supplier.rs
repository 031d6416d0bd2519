//! Fallback-network supplier directory entries and the agent capability card

use serde::{Deserialize, Serialize};

/// Protocols a supplier advertises on the discovery network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupplierProtocol {
    /// Primary payment-gated (HTTP 402) order protocol
    PaymentGated,
    /// Simplified single-round fallback handshake
    Fallback,
    /// Legacy out-of-band ordering
    Traditional,
}

/// A static directory entry on the fallback discovery network.
///
/// Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub rating: f32,
    pub delivery_estimate: String,
    pub supported_protocols: Vec<SupplierProtocol>,
}

impl Supplier {
    pub fn supports(&self, protocol: SupplierProtocol) -> bool {
        self.supported_protocols.contains(&protocol)
    }
}

/// Static capability descriptor served at `/.well-known/agent.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub capabilities: Vec<String>,
    pub payment_types: Vec<String>,
}
