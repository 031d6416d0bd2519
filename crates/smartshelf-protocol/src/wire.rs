//! Wire contract: JSON bodies and header names shared by both protocol halves
//!
//! Bodies serialize in camelCase. Amounts are fixed-precision decimals and
//! serialize as strings, so `0.000100` survives the trip untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smartshelf_types::{Invoice, InvoiceId, Order, OrderStatus};

/// Header carrying the settlement proof on the second round trip
pub const PAYMENT_PROOF_HEADER: &str = "x-payment-hash";

/// Header echoing the challenged invoice id back to the supplier
pub const INVOICE_ID_HEADER: &str = "x-invoice-id";

/// Body of an order request (both round trips use the same body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyStockRequest {
    pub item: String,
    pub quantity: u32,
}

/// Invoice terms inside a 402 challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub amount: Decimal,
    pub currency: String,
    pub destination: String,
    pub invoice_id: String,
}

impl From<Invoice> for PaymentDetails {
    fn from(invoice: Invoice) -> Self {
        Self {
            amount: invoice.amount,
            currency: invoice.currency,
            destination: invoice.destination,
            invoice_id: invoice.invoice_id.0,
        }
    }
}

impl From<PaymentDetails> for Invoice {
    fn from(details: PaymentDetails) -> Self {
        Self {
            amount: details.amount,
            currency: details.currency,
            destination: details.destination,
            invoice_id: InvoiceId(details.invoice_id),
        }
    }
}

/// 402 challenge body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredBody {
    pub error: String,
    pub message: String,
    pub payment_details: PaymentDetails,
}

/// Successful fulfillment body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentBody {
    pub success: bool,
    pub message: String,
    pub tracking_id: String,
}

/// One ledger entry as exposed on the supplier's order listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntry {
    pub order_id: String,
    pub placed_at: DateTime<Utc>,
    pub item: String,
    pub quantity: u32,
    pub total_price: Decimal,
    pub proof: String,
    pub status: String,
}

impl From<Order> for OrderEntry {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id.0,
            placed_at: order.placed_at,
            item: order.item,
            quantity: order.quantity,
            total_price: order.total_price,
            proof: order.proof.0,
            status: match order.status {
                OrderStatus::Dispatched => "dispatched".to_string(),
            },
        }
    }
}

/// Body of the supplier's order listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierOrdersBody {
    pub orders: Vec<OrderEntry>,
    pub total_revenue: Decimal,
}
