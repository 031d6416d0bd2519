//! SmartShelf Supplier Service
//!
//! HTTP front for the order desk. `POST /buy-stock` without a proof header is
//! answered 402 with the invoice; with a proof header it verifies, records,
//! and fulfills. The order ledger and capability card are served read-only.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, Timelike};
use smartshelf_ledger::OrderLedger;
use smartshelf_pricing::{PricingConfig, PricingEngine};
use smartshelf_protocol::{
    BearerVerifier, BuyOutcome, BuyStockRequest, OrderDesk, OrderEntry, SupplierOrdersBody,
    INVOICE_ID_HEADER, PAYMENT_PROOF_HEADER,
};
use smartshelf_settlement::Address;
use smartshelf_types::{AgentCard, InvoiceId, SettlementProof};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_WALLET: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

struct AppState {
    desk: OrderDesk,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn buy_stock(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<BuyStockRequest>,
) -> Response {
    let proof = header_value(&headers, PAYMENT_PROOF_HEADER).map(SettlementProof);
    let invoice_id = header_value(&headers, INVOICE_ID_HEADER).map(InvoiceId);
    let hour = Local::now().hour();

    match state.desk.handle_buy(&request, proof, invoice_id, hour).await {
        BuyOutcome::PaymentRequired(body) => {
            (StatusCode::PAYMENT_REQUIRED, Json(body)).into_response()
        }
        BuyOutcome::Fulfilled(body) => (StatusCode::OK, Json(body)).into_response(),
        BuyOutcome::Rejected { message } => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "success": false, "error": message })),
        )
            .into_response(),
    }
}

async fn supplier_orders(State(state): State<Arc<AppState>>) -> Json<SupplierOrdersBody> {
    let ledger = state.desk.ledger();
    let orders = ledger
        .orders()
        .await
        .into_iter()
        .map(OrderEntry::from)
        .collect();
    let total_revenue = ledger.total_revenue().await;

    Json(SupplierOrdersBody {
        orders,
        total_revenue,
    })
}

async fn agent_card() -> Json<AgentCard> {
    Json(AgentCard {
        name: "SmartShelf Supplier".to_string(),
        capabilities: vec![
            "payment-gated-orders".to_string(),
            "order-ledger".to_string(),
        ],
        payment_types: vec!["x402".to_string()],
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "smartshelf-supplier",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let wallet = Address(
        std::env::var("SUPPLIER_WALLET_ADDRESS").unwrap_or_else(|_| DEFAULT_WALLET.to_string()),
    );
    let port: u16 = match std::env::var("SUPPLIER_PORT") {
        Ok(raw) => raw.parse()?,
        Err(_) => DEFAULT_PORT,
    };

    let mut pricing = PricingConfig::default();
    if let Ok(raw) = std::env::var("SUPPLIER_BASE_PRICE") {
        pricing.base_price = raw.parse()?;
    }

    let desk = OrderDesk::new(
        PricingEngine::new(pricing),
        OrderLedger::new(),
        Arc::new(BearerVerifier),
        wallet.clone(),
    );
    let state = Arc::new(AppState { desk });

    // Agents read the proof header name off the challenge; expose it to
    // browser-based clients as well.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(PAYMENT_PROOF_HEADER)]);

    let app = Router::new()
        .route("/buy-stock", post(buy_stock))
        .route("/supplier/orders", get(supplier_orders))
        .route("/.well-known/agent.json", get(agent_card))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, %wallet, "supplier service listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
