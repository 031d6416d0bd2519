//! Invoices, settlement proofs, and fulfilled orders

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an issued invoice
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub String);

impl InvoiceId {
    pub fn new() -> Self {
        Self(format!("INV-{}", Uuid::new_v4()))
    }
}

impl Default for InvoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a recorded order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new() -> Self {
        Self(format!("ORD-{}", Uuid::new_v4()))
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bearer evidence that an on-chain payment occurred.
///
/// The protocol treats possession as sufficient: presence unlocks fulfillment.
/// Verification strictness is decided by the injected proof verifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementProof(pub String);

impl SettlementProof {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SettlementProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A priced challenge issued by the supplier for an unsettled order request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Amount in the base currency unit, fixed decimal precision
    pub amount: Decimal,
    pub currency: String,
    /// Settlement destination address
    pub destination: String,
    pub invoice_id: InvoiceId,
}

/// Fulfillment status of a recorded order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Dispatched,
}

/// An order recorded by the supplier ledger. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub placed_at: DateTime<Utc>,
    pub item: String,
    pub quantity: u32,
    pub total_price: Decimal,
    pub proof: SettlementProof,
    pub status: OrderStatus,
}

/// Agent-side mirror of a completed restock workflow.
///
/// Purely observational; the core never reads it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub at: DateTime<Utc>,
    pub item: String,
    pub quantity: u32,
    /// Tracking id or fallback order id, whichever channel fulfilled
    pub reference: String,
    pub status: String,
}
