//! SmartShelf Agent Service
//!
//! Seeds the store inventory, wires the watcher to a payment-gated supplier,
//! and simulates the sales floor: a sale every few seconds against a random
//! item. Threshold crossings trigger restock workflows autonomously; the
//! terminal log is the storefront.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rust_decimal::Decimal;
use smartshelf_advisor::{HeuristicPolicy, HttpAdvisor, HttpAdvisorConfig, StockAdvisor};
use smartshelf_discovery::DiscoveryGateway;
use smartshelf_protocol::SupplierClient;
use smartshelf_settlement::{Address, InMemoryChain};
use smartshelf_types::{InventoryItem, ItemId};
use smartshelf_watcher::{InventoryWatcher, WorkflowOutcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SUPPLIER_URL: &str = "http://localhost:3001";
const DEFAULT_AGENT_WALLET: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const SALE_INTERVAL: Duration = Duration::from_secs(3);

fn seed_inventory() -> Vec<InventoryItem> {
    vec![
        InventoryItem::new("Basmati Rice", "kg", 38, 10, 50),
        InventoryItem::new("Nataraj Pencils", "box", 15, 5, 100),
        InventoryItem::new("Lays Chips", "pkt", 8, 20, 50),
        InventoryItem::new("Thums Up", "btl", 45, 12, 60),
        InventoryItem::new("Dairy Milk", "bar", 22, 15, 100),
    ]
}

fn build_advisor() -> StockAdvisor {
    let policy = HeuristicPolicy::default();
    if std::env::var("SHELF_ADVISOR_URL").is_ok() {
        info!("external advisory service configured");
        StockAdvisor::with_provider(Arc::new(HttpAdvisor::new(HttpAdvisorConfig::default())), policy)
    } else {
        StockAdvisor::heuristic(policy)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let supplier_url =
        std::env::var("SUPPLIER_URL").unwrap_or_else(|_| DEFAULT_SUPPLIER_URL.to_string());
    let wallet = Address(
        std::env::var("AGENT_WALLET_ADDRESS").unwrap_or_else(|_| DEFAULT_AGENT_WALLET.to_string()),
    );
    let funds: Decimal = match std::env::var("AGENT_FUNDS") {
        Ok(raw) => raw.parse()?,
        Err(_) => "0.05".parse()?,
    };

    let chain = Arc::new(InMemoryChain::funded(wallet.clone(), funds));
    let client = SupplierClient::new(supplier_url.clone(), chain.clone())?;
    let watcher = InventoryWatcher::new(
        build_advisor(),
        Arc::new(client),
        DiscoveryGateway::default(),
    );

    let mut ids: Vec<ItemId> = Vec::new();
    for item in seed_inventory() {
        info!(item = %item.name, stock = item.stock, threshold = item.threshold, "stocked");
        ids.push(watcher.add_item(item).await);
    }

    info!(%supplier_url, %wallet, %funds, "store agent running, simulating sales");

    let mut ticker = tokio::time::interval(SALE_INTERVAL);
    loop {
        ticker.tick().await;

        // Jitter so sales do not land on a metronome
        let (idx, jitter_ms) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(0..ids.len()), rng.gen_range(0..1500u64))
        };
        tokio::time::sleep(Duration::from_millis(jitter_ms)).await;

        let id = &ids[idx];
        let outcome = watcher.record_sale(id).await;
        let stock = watcher.stock_of(id).await.unwrap_or(0);

        match outcome {
            WorkflowOutcome::Restocked { source, quantity } => {
                info!(item = %id, stock, quantity, ?source, "restocked");
            }
            WorkflowOutcome::NotNeeded => {
                info!(item = %id, stock, "sale");
            }
            WorkflowOutcome::AlreadyActive => {
                info!(item = %id, stock, "sale (restock already in flight)");
            }
            WorkflowOutcome::Failed => {
                info!(item = %id, stock, "sale (restock attempt failed)");
            }
        }
    }
}
