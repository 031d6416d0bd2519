//! SmartShelf Ledger - supplier-side order record and invoice store
//!
//! The ledger is:
//! - Append-only (entries are never removed or mutated after insertion)
//! - Idempotent by settlement proof (first writer wins; a duplicate proof
//!   returns the original entry and appends nothing)
//! - Insertion-ordered (newest first for display, chronological for
//!   aggregation)
//!
//! The invoice store pins issued invoices by id so that a proof submitted
//! later can be validated against the originally quoted amount rather than a
//! recomputed one.
//!
//! # Invariants
//!
//! 1. `total_revenue` equals the sum of `total_price` over all entries
//! 2. At most one entry per settlement proof
//! 3. Each `record` call is atomic; concurrent appends from different agents
//!    are ordered only by arrival

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use rust_decimal::Decimal;
use smartshelf_types::{Invoice, InvoiceId, Order, SettlementProof};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur in ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Order carries an empty settlement proof")]
    EmptyProof,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Outcome of a `record` call
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub order: Order,
    /// False when the proof was already recorded and the original entry was
    /// returned instead
    pub inserted: bool,
}

/// The supplier order ledger
///
/// Thread-safe and cheap to clone; all clones share the same entries.
#[derive(Clone, Default)]
pub struct OrderLedger {
    /// All fulfilled orders, in arrival order
    entries: Arc<RwLock<Vec<Order>>>,
    /// Settlement proof -> index into `entries`
    by_proof: Arc<RwLock<HashMap<SettlementProof, usize>>>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order, keyed by its settlement proof.
    ///
    /// Idempotent: if the proof was already recorded, the original entry is
    /// returned and nothing is appended, so revenue is never double-counted.
    pub async fn record(&self, order: Order) -> Result<RecordOutcome> {
        if order.proof.is_empty() {
            return Err(LedgerError::EmptyProof);
        }

        let mut entries = self.entries.write().await;
        let mut by_proof = self.by_proof.write().await;

        if let Some(&idx) = by_proof.get(&order.proof) {
            return Ok(RecordOutcome {
                order: entries[idx].clone(),
                inserted: false,
            });
        }

        by_proof.insert(order.proof.clone(), entries.len());
        entries.push(order.clone());

        Ok(RecordOutcome {
            order,
            inserted: true,
        })
    }

    /// All orders, newest first (display order)
    pub async fn orders(&self) -> Vec<Order> {
        let entries = self.entries.read().await;
        entries.iter().rev().cloned().collect()
    }

    /// All orders in arrival order (aggregation order)
    pub async fn chronological(&self) -> Vec<Order> {
        self.entries.read().await.clone()
    }

    /// Sum of `total_price` over all recorded orders
    pub async fn total_revenue(&self) -> Decimal {
        let entries = self.entries.read().await;
        entries.iter().map(|o| o.total_price).sum()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Pinned invoices awaiting settlement, keyed by invoice id.
///
/// An invoice is stored when the challenge is issued and consumed when the
/// proof arrives, so the amount charged is the amount quoted even if the
/// pricing window flips in between.
///
/// Bounded: challenges that are never settled (crashed clients, failed
/// settlements, bare unpaid requests) would otherwise pin invoices forever,
/// so the store holds at most `capacity` pins and evicts the oldest when
/// full. An evicted pin degrades gracefully downstream to a recomputed price.
#[derive(Clone)]
pub struct InvoiceStore {
    inner: Arc<RwLock<PendingInvoices>>,
}

struct PendingInvoices {
    by_id: HashMap<InvoiceId, Invoice>,
    /// Issue order, oldest first. May contain ids already consumed; those are
    /// skipped during eviction.
    order: VecDeque<InvoiceId>,
    capacity: usize,
}

impl Default for InvoiceStore {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl InvoiceStore {
    /// Pins retained before the oldest unsettled one is evicted
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding at most `capacity` pins. Capacity must be > 0.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "InvoiceStore capacity must be positive");
        Self {
            inner: Arc::new(RwLock::new(PendingInvoices {
                by_id: HashMap::new(),
                order: VecDeque::new(),
                capacity,
            })),
        }
    }

    /// Pin an issued invoice, evicting the oldest live pin when full
    pub async fn issue(&self, invoice: Invoice) {
        let mut inner = self.inner.write().await;
        while inner.by_id.len() >= inner.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.by_id.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(invoice.invoice_id.clone());
        inner.by_id.insert(invoice.invoice_id.clone(), invoice);
    }

    /// Retrieve and consume a pinned invoice
    pub async fn take(&self, invoice_id: &InvoiceId) -> Option<Invoice> {
        let mut inner = self.inner.write().await;
        inner.by_id.remove(invoice_id)
    }

    pub async fn pending_count(&self) -> usize {
        self.inner.read().await.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use smartshelf_types::{OrderId, OrderStatus};

    fn order(proof: &str, total: Decimal) -> Order {
        Order {
            order_id: OrderId::new(),
            placed_at: Utc::now(),
            item: "Basmati Rice".to_string(),
            quantity: 20,
            total_price: total,
            proof: SettlementProof(proof.to_string()),
            status: OrderStatus::Dispatched,
        }
    }

    #[tokio::test]
    async fn empty_ledger_has_zero_revenue() {
        let ledger = OrderLedger::new();
        assert!(ledger.is_empty().await);
        assert_eq!(ledger.total_revenue().await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn revenue_is_sum_of_totals() {
        let ledger = OrderLedger::new();
        ledger.record(order("0xaaa", dec!(0.0001))).await.unwrap();
        ledger.record(order("0xbbb", dec!(0.00012))).await.unwrap();
        ledger.record(order("0xccc", dec!(0.00011))).await.unwrap();
        assert_eq!(ledger.len().await, 3);
        assert_eq!(ledger.total_revenue().await, dec!(0.00033));
    }

    #[tokio::test]
    async fn duplicate_proof_is_not_double_counted() {
        let ledger = OrderLedger::new();
        let first = ledger.record(order("0xdup", dec!(0.0001))).await.unwrap();
        assert!(first.inserted);

        let second = ledger.record(order("0xdup", dec!(0.0001))).await.unwrap();
        assert!(!second.inserted);
        assert_eq!(second.order.order_id, first.order.order_id);

        assert_eq!(ledger.len().await, 1);
        assert_eq!(ledger.total_revenue().await, dec!(0.0001));
    }

    #[tokio::test]
    async fn orders_are_newest_first() {
        let ledger = OrderLedger::new();
        ledger.record(order("0x1", dec!(0.0001))).await.unwrap();
        ledger.record(order("0x2", dec!(0.0001))).await.unwrap();

        let display = ledger.orders().await;
        assert_eq!(display[0].proof, SettlementProof("0x2".to_string()));
        assert_eq!(display[1].proof, SettlementProof("0x1".to_string()));

        let chrono_order = ledger.chronological().await;
        assert_eq!(chrono_order[0].proof, SettlementProof("0x1".to_string()));
    }

    #[tokio::test]
    async fn empty_proof_is_rejected() {
        let ledger = OrderLedger::new();
        let result = ledger.record(order("", dec!(0.0001))).await;
        assert!(matches!(result, Err(LedgerError::EmptyProof)));
    }

    #[tokio::test]
    async fn invoice_store_pins_and_consumes() {
        let store = InvoiceStore::new();
        let invoice = Invoice {
            amount: dec!(0.00012),
            currency: "ETH".to_string(),
            destination: "0xsupplier".to_string(),
            invoice_id: InvoiceId::new(),
        };
        let id = invoice.invoice_id.clone();

        store.issue(invoice.clone()).await;
        assert_eq!(store.pending_count().await, 1);

        let taken = store.take(&id).await.unwrap();
        assert_eq!(taken.amount, invoice.amount);
        // Consumed: a second take finds nothing
        assert!(store.take(&id).await.is_none());
    }

    fn invoice(amount: Decimal) -> Invoice {
        Invoice {
            amount,
            currency: "ETH".to_string(),
            destination: "0xsupplier".to_string(),
            invoice_id: InvoiceId::new(),
        }
    }

    #[tokio::test]
    async fn invoice_store_evicts_oldest_pin_at_capacity() {
        let store = InvoiceStore::with_capacity(2);
        let first = invoice(dec!(0.0001));
        let second = invoice(dec!(0.00011));
        let third = invoice(dec!(0.00012));
        let ids = [
            first.invoice_id.clone(),
            second.invoice_id.clone(),
            third.invoice_id.clone(),
        ];

        store.issue(first).await;
        store.issue(second).await;
        store.issue(third).await;

        // Abandoned pins never grow past capacity
        assert_eq!(store.pending_count().await, 2);
        assert!(store.take(&ids[0]).await.is_none());
        assert!(store.take(&ids[1]).await.is_some());
        assert!(store.take(&ids[2]).await.is_some());
    }

    #[tokio::test]
    async fn consumed_pins_do_not_block_eviction() {
        let store = InvoiceStore::with_capacity(2);
        let first = invoice(dec!(0.0001));
        let first_id = first.invoice_id.clone();
        let second = invoice(dec!(0.0001));
        let second_id = second.invoice_id.clone();

        store.issue(first).await;
        store.issue(second).await;
        store.take(&first_id).await.unwrap();

        let third = invoice(dec!(0.0001));
        let third_id = third.invoice_id.clone();
        let fourth = invoice(dec!(0.0001));
        let fourth_id = fourth.invoice_id.clone();
        store.issue(third).await;
        store.issue(fourth).await;

        assert_eq!(store.pending_count().await, 2);
        // The second pin was the oldest live one and got evicted; the two
        // most recent survive
        assert!(store.take(&second_id).await.is_none());
        assert!(store.take(&third_id).await.is_some());
        assert!(store.take(&fourth_id).await.is_some());
    }
}
