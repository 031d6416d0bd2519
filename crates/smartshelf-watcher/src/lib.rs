//! SmartShelf Watcher - inventory observation and the autonomous restock loop
//!
//! The watcher owns the item collection, notices threshold crossings, and
//! runs the restock workflow: consult the advisor, procure through the
//! payment-gated channel, and fall back to the discovery network when the
//! primary channel fails. Restocking is fire-and-forget from the sales path:
//! workflow failures are logged and surfaced as an outcome, never propagated
//! as errors.
//!
//! # Invariants
//!
//! 1. At most one restock workflow runs at a time; crossings observed while
//!    one is active are dropped, not queued
//! 2. Stock is mutated only by sales and by fulfilled restocks
//! 3. The single-flight guard is released on every exit path, success or
//!    failure

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use smartshelf_advisor::{StockAdvisor, StockSnapshot};
use smartshelf_discovery::DiscoveryGateway;
use smartshelf_protocol::OrderChannel;
use smartshelf_types::{InventoryItem, ItemId, RingLog, TransactionRecord};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Channel that ultimately fulfilled a restock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestockSource {
    PaymentGated,
    Fallback,
}

/// Outcome of one observation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// A restock workflow ran to completion and stock was credited
    Restocked {
        source: RestockSource,
        quantity: u32,
    },
    /// Stock is healthy, or the advisor said to hold
    NotNeeded,
    /// Another workflow holds the single-flight guard; this crossing is dropped
    AlreadyActive,
    /// Both the payment-gated channel and the fallback network failed
    Failed,
}

/// Watches inventory and runs restock workflows
#[derive(Clone)]
pub struct InventoryWatcher {
    items: Arc<RwLock<HashMap<ItemId, InventoryItem>>>,
    advisor: Arc<StockAdvisor>,
    channel: Arc<dyn OrderChannel>,
    discovery: DiscoveryGateway,
    /// Single-flight gate over the whole workflow
    gate: Arc<Mutex<()>>,
    history: Arc<RwLock<RingLog<TransactionRecord>>>,
    /// Sales observed per item since its last restock
    sales: Arc<RwLock<HashMap<ItemId, usize>>>,
}

impl InventoryWatcher {
    /// Retained transaction records before the oldest is evicted
    pub const HISTORY_CAPACITY: usize = 50;

    pub fn new(
        advisor: StockAdvisor,
        channel: Arc<dyn OrderChannel>,
        discovery: DiscoveryGateway,
    ) -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            advisor: Arc::new(advisor),
            channel,
            discovery,
            gate: Arc::new(Mutex::new(())),
            history: Arc::new(RwLock::new(RingLog::new(Self::HISTORY_CAPACITY))),
            sales: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn add_item(&self, item: InventoryItem) -> ItemId {
        let id = item.id.clone();
        self.items.write().await.insert(id.clone(), item);
        id
    }

    pub async fn items(&self) -> Vec<InventoryItem> {
        self.items.read().await.values().cloned().collect()
    }

    pub async fn stock_of(&self, id: &ItemId) -> Option<u32> {
        self.items.read().await.get(id).map(|item| item.stock)
    }

    /// Transaction history, newest first
    pub async fn history(&self) -> Vec<TransactionRecord> {
        self.history.read().await.iter().cloned().collect()
    }

    /// Record one sale and observe the item for a threshold crossing
    pub async fn record_sale(&self, id: &ItemId) -> WorkflowOutcome {
        let sold = {
            let mut items = self.items.write().await;
            match items.get_mut(id) {
                Some(item) => item.record_sale(),
                None => {
                    warn!(item = %id, "sale recorded for unknown item");
                    return WorkflowOutcome::Failed;
                }
            }
        };

        if sold {
            *self.sales.write().await.entry(id.clone()).or_insert(0) += 1;
        }

        self.observe(id).await
    }

    /// Check one item against its threshold and run the restock workflow if
    /// it is low and no other workflow is active.
    pub async fn observe(&self, id: &ItemId) -> WorkflowOutcome {
        let low = {
            let items = self.items.read().await;
            match items.get(id) {
                Some(item) => item.is_low(),
                None => {
                    warn!(item = %id, "observed unknown item");
                    return WorkflowOutcome::Failed;
                }
            }
        };

        if !low {
            return WorkflowOutcome::NotNeeded;
        }

        // Crossings seen while a workflow is active are dropped; the guard is
        // released when this scope ends, on every path.
        let _guard = match self.gate.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                info!(item = %id, "restock already active, dropping crossing");
                return WorkflowOutcome::AlreadyActive;
            }
        };

        self.run_guarded(id).await
    }

    /// Guarded section of `observe`. Another workflow may have credited stock
    /// between the crossing snapshot and guard acquisition, so the item is
    /// re-read and re-checked before the advisor is consulted.
    async fn run_guarded(&self, id: &ItemId) -> WorkflowOutcome {
        let item = {
            let items = self.items.read().await;
            match items.get(id) {
                Some(item) => item.clone(),
                None => {
                    warn!(item = %id, "observed unknown item");
                    return WorkflowOutcome::Failed;
                }
            }
        };

        if !item.is_low() {
            info!(item = %item.name, stock = item.stock, "stock recovered before workflow start");
            return WorkflowOutcome::NotNeeded;
        }

        self.run_workflow(&item).await
    }

    async fn run_workflow(&self, item: &InventoryItem) -> WorkflowOutcome {
        let recent_sales = self
            .sales
            .read()
            .await
            .get(&item.id)
            .copied()
            .unwrap_or(0);
        let snapshot = StockSnapshot {
            item: item.name.clone(),
            unit: item.unit.clone(),
            stock: item.stock,
            threshold: item.threshold,
            recent_sales,
        };

        let recommendation = self.advisor.recommend(&snapshot).await;
        if !recommendation.should_restock {
            info!(item = %item.name, reason = %recommendation.reason, "advisor holds");
            return WorkflowOutcome::NotNeeded;
        }

        let quantity = recommendation.recommended_quantity;
        info!(
            item = %item.name,
            quantity,
            urgency = recommendation.urgency_score,
            "restock workflow started"
        );

        match self.channel.procure(&item.name, quantity).await {
            Ok(receipt) => {
                self.credit(item, quantity, receipt.tracking_id, "restocked")
                    .await;
                WorkflowOutcome::Restocked {
                    source: RestockSource::PaymentGated,
                    quantity,
                }
            }
            Err(error) => {
                warn!(item = %item.name, %error, "payment-gated channel failed, trying fallback");
                self.fallback(item, quantity).await
            }
        }
    }

    /// One-shot fallback through the discovery network
    async fn fallback(&self, item: &InventoryItem, quantity: u32) -> WorkflowOutcome {
        let suppliers = match self.discovery.discover(&item.name, quantity) {
            Ok(suppliers) => suppliers,
            Err(error) => {
                warn!(item = %item.name, %error, "restock workflow failed");
                return WorkflowOutcome::Failed;
            }
        };

        // Best-rated supplier only; the fallback is one shot, not a retry loop
        let receipt = self
            .discovery
            .place_order(&suppliers[0], &item.name, quantity)
            .await;
        if !receipt.success {
            warn!(item = %item.name, "fallback order declined");
            return WorkflowOutcome::Failed;
        }

        self.credit(item, quantity, receipt.order_id, "restocked-fallback")
            .await;
        WorkflowOutcome::Restocked {
            source: RestockSource::Fallback,
            quantity,
        }
    }

    async fn credit(&self, item: &InventoryItem, quantity: u32, reference: String, status: &str) {
        {
            let mut items = self.items.write().await;
            if let Some(live) = items.get_mut(&item.id) {
                live.receive(quantity);
                info!(item = %live.name, stock = live.stock, "stock credited");
            }
        }

        self.sales.write().await.insert(item.id.clone(), 0);
        self.history.write().await.push(TransactionRecord {
            at: Utc::now(),
            item: item.name.clone(),
            quantity,
            reference,
            status: status.to_string(),
        });
    }
}
