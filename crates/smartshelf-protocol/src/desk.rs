//! Supplier-side order desk
//!
//! One entry point, `handle_buy`, implements both protocol round trips:
//! without a proof it prices the request and answers with a challenge,
//! pinning the invoice; with a proof it verifies, records, and fulfills.
//! HTTP framing (status codes, headers) is the service binary's job.

use chrono::Utc;
use smartshelf_ledger::{InvoiceStore, OrderLedger};
use smartshelf_pricing::PricingEngine;
use smartshelf_settlement::Address;
use smartshelf_types::{Invoice, InvoiceId, Order, OrderId, OrderStatus, SettlementProof};
use std::sync::Arc;
use tracing::{info, warn};

use crate::verify::ProofVerifier;
use crate::wire::{BuyStockRequest, FulfillmentBody, PaymentRequiredBody};

/// Result of handling one order request
#[derive(Debug, Clone)]
pub enum BuyOutcome {
    /// No valid proof attached; here are the payment terms (HTTP 402)
    PaymentRequired(PaymentRequiredBody),
    /// Proof accepted, order recorded and dispatched (HTTP 200)
    Fulfilled(FulfillmentBody),
    /// Proof or request refused (HTTP 400)
    Rejected { message: String },
}

/// The supplier half of the order protocol
#[derive(Clone)]
pub struct OrderDesk {
    pricing: PricingEngine,
    ledger: OrderLedger,
    invoices: InvoiceStore,
    verifier: Arc<dyn ProofVerifier>,
    wallet: Address,
    currency: String,
}

impl OrderDesk {
    pub fn new(
        pricing: PricingEngine,
        ledger: OrderLedger,
        verifier: Arc<dyn ProofVerifier>,
        wallet: Address,
    ) -> Self {
        Self {
            pricing,
            ledger,
            invoices: InvoiceStore::new(),
            verifier,
            wallet,
            currency: "ETH".to_string(),
        }
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    /// Invoices challenged but not yet settled
    pub async fn pending_invoices(&self) -> usize {
        self.invoices.pending_count().await
    }

    /// Handle one order request at local `hour`.
    ///
    /// An empty proof header is treated the same as an absent one.
    pub async fn handle_buy(
        &self,
        request: &BuyStockRequest,
        proof: Option<SettlementProof>,
        invoice_id: Option<InvoiceId>,
        hour: u32,
    ) -> BuyOutcome {
        if request.quantity == 0 {
            return BuyOutcome::Rejected {
                message: "Order quantity must be positive".to_string(),
            };
        }

        match proof.filter(|p| !p.is_empty()) {
            None => self.challenge(request, hour).await,
            Some(proof) => self.fulfill(request, proof, invoice_id, hour).await,
        }
    }

    async fn challenge(&self, request: &BuyStockRequest, hour: u32) -> BuyOutcome {
        let amount = self.pricing.quote(request.quantity, hour);
        let invoice = Invoice {
            amount,
            currency: self.currency.clone(),
            destination: self.wallet.0.clone(),
            invoice_id: InvoiceId::new(),
        };
        self.invoices.issue(invoice.clone()).await;

        info!(
            item = %request.item,
            quantity = request.quantity,
            %amount,
            invoice = %invoice.invoice_id,
            "challenge issued"
        );

        BuyOutcome::PaymentRequired(PaymentRequiredBody {
            error: "Payment Required".to_string(),
            message: format!(
                "Payment of {amount} {} required to {}",
                self.currency, self.wallet
            ),
            payment_details: invoice.into(),
        })
    }

    async fn fulfill(
        &self,
        request: &BuyStockRequest,
        proof: SettlementProof,
        invoice_id: Option<InvoiceId>,
        hour: u32,
    ) -> BuyOutcome {
        // Prefer the pinned invoice the challenge quoted; requests that never
        // echo an invoice id are priced at the current window instead.
        let pinned = match invoice_id {
            Some(id) => self.invoices.take(&id).await,
            None => None,
        };
        let was_pinned = pinned.is_some();
        let invoice = pinned.unwrap_or_else(|| Invoice {
            amount: self.pricing.quote(request.quantity, hour),
            currency: self.currency.clone(),
            destination: self.wallet.0.clone(),
            invoice_id: InvoiceId::new(),
        });

        if let Err(error) = self.verifier.verify(&proof, &invoice).await {
            warn!(item = %request.item, %proof, %error, "proof refused");
            // Keep the quoted terms available for a corrected resubmission
            if was_pinned {
                self.invoices.issue(invoice).await;
            }
            return BuyOutcome::Rejected {
                message: error.to_string(),
            };
        }

        let order = Order {
            order_id: OrderId::new(),
            placed_at: Utc::now(),
            item: request.item.clone(),
            quantity: request.quantity,
            total_price: invoice.amount,
            proof,
            status: OrderStatus::Dispatched,
        };

        let outcome = match self.ledger.record(order).await {
            Ok(outcome) => outcome,
            Err(error) => {
                return BuyOutcome::Rejected {
                    message: error.to_string(),
                }
            }
        };

        if outcome.inserted {
            info!(
                order = %outcome.order.order_id,
                item = %outcome.order.item,
                quantity = outcome.order.quantity,
                total = %outcome.order.total_price,
                "order recorded and dispatched"
            );
        } else {
            info!(order = %outcome.order.order_id, "duplicate proof, replaying fulfillment");
        }

        BuyOutcome::Fulfilled(FulfillmentBody {
            success: true,
            message: format!(
                "Order fulfilled: {} x{}",
                outcome.order.item, outcome.order.quantity
            ),
            tracking_id: tracking_id_for(&outcome.order),
        })
    }
}

/// Tracking ids are derived from the order id, so replaying a proof returns
/// the same tracking id as the original fulfillment.
fn tracking_id_for(order: &Order) -> String {
    order.order_id.0.replacen("ORD-", "TRK-", 1)
}
