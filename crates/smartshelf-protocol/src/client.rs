//! Agent-side protocol client
//!
//! `SupplierClient` drives the two round trips over HTTP: request, receive
//! the 402 challenge, settle on the injected settlement channel, then repost
//! with the proof header. Each HTTP round trip carries its own timeout; the
//! settlement confirmation wait is bounded separately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use smartshelf_settlement::{Address, SettlementChannel};
use smartshelf_types::{InvoiceId, SettlementProof};
use tracing::{info, warn};

use crate::state::{AttemptState, OrderAttempt};
use crate::wire::{
    BuyStockRequest, FulfillmentBody, PaymentRequiredBody, INVOICE_ID_HEADER, PAYMENT_PROOF_HEADER,
};
use crate::{ProtocolError, Result};

/// Completed procurement through the payment-gated channel
#[derive(Debug, Clone)]
pub struct ProcurementReceipt {
    pub item: String,
    pub quantity: u32,
    pub amount_paid: Decimal,
    pub proof: SettlementProof,
    pub tracking_id: String,
    pub message: String,
}

/// Capability to procure stock from a supplier.
///
/// The watcher depends on this seam, not on HTTP, so workflows are testable
/// against an in-process desk.
#[async_trait]
pub trait OrderChannel: Send + Sync {
    async fn procure(&self, item: &str, quantity: u32) -> Result<ProcurementReceipt>;
}

/// HTTP client for a payment-gated supplier
pub struct SupplierClient {
    http: reqwest::Client,
    base_url: String,
    settlement: Arc<dyn SettlementChannel>,
    confirm_timeout: Duration,
}

impl SupplierClient {
    /// Bound on each HTTP round trip
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Bound on waiting for settlement confirmation
    pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>, settlement: Arc<dyn SettlementChannel>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProtocolError::Network {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settlement,
            confirm_timeout: Self::CONFIRM_TIMEOUT,
        })
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// Round trip one: post the bare request, expect a 402 challenge
    async fn request_challenge(&self, request: &BuyStockRequest) -> Result<PaymentRequiredBody> {
        let response = self
            .http
            .post(format!("{}/buy-stock", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| map_transport(e, "order request"))?;

        match response.status() {
            StatusCode::PAYMENT_REQUIRED => {
                response
                    .json()
                    .await
                    .map_err(|e| ProtocolError::Response {
                        message: format!("malformed challenge body: {e}"),
                    })
            }
            status => Err(ProtocolError::Response {
                message: format!("expected a payment challenge, got HTTP {status}"),
            }),
        }
    }

    /// Round trip two: repost with the proof and invoice headers
    async fn submit_proof(
        &self,
        request: &BuyStockRequest,
        proof: &SettlementProof,
        invoice_id: &InvoiceId,
    ) -> Result<FulfillmentBody> {
        let response = self
            .http
            .post(format!("{}/buy-stock", self.base_url))
            .header(PAYMENT_PROOF_HEADER, proof.0.as_str())
            .header(INVOICE_ID_HEADER, invoice_id.0.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| map_transport(e, "proof submission"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProtocolError::Response {
                message: format!("proof refused with HTTP {status}"),
            });
        }

        let body: FulfillmentBody =
            response
                .json()
                .await
                .map_err(|e| ProtocolError::Response {
                    message: format!("malformed fulfillment body: {e}"),
                })?;

        if !body.success {
            return Err(ProtocolError::Response {
                message: format!("supplier declined fulfillment: {}", body.message),
            });
        }

        Ok(body)
    }

    async fn drive(&self, attempt: &mut OrderAttempt) -> Result<ProcurementReceipt> {
        let request = BuyStockRequest {
            item: attempt.item.clone(),
            quantity: attempt.quantity,
        };

        let challenge = self.request_challenge(&request).await?;
        attempt.advance(AttemptState::ChallengeIssued)?;
        attempt.invoice = Some(challenge.payment_details.clone().into());

        info!(
            item = %attempt.item,
            amount = %challenge.payment_details.amount,
            invoice = %challenge.payment_details.invoice_id,
            "challenge received, settling"
        );

        attempt.advance(AttemptState::Settling)?;
        let destination = Address(challenge.payment_details.destination.clone());
        let tx_hash = self
            .settlement
            .transfer(&destination, challenge.payment_details.amount)
            .await?;
        tokio::time::timeout(self.confirm_timeout, self.settlement.confirm(&tx_hash))
            .await
            .map_err(|_| ProtocolError::Timeout {
                stage: "settlement confirmation",
            })??;

        let proof = SettlementProof(tx_hash.0);
        attempt.proof = Some(proof.clone());

        let invoice_id = InvoiceId(challenge.payment_details.invoice_id.clone());
        let fulfillment = self.submit_proof(&request, &proof, &invoice_id).await?;
        attempt.advance(AttemptState::Verified)?;
        attempt.advance(AttemptState::Fulfilled)?;

        info!(
            item = %attempt.item,
            quantity = attempt.quantity,
            tracking = %fulfillment.tracking_id,
            "order fulfilled"
        );

        Ok(ProcurementReceipt {
            item: attempt.item.clone(),
            quantity: attempt.quantity,
            amount_paid: challenge.payment_details.amount,
            proof,
            tracking_id: fulfillment.tracking_id,
            message: fulfillment.message,
        })
    }
}

fn map_transport(error: reqwest::Error, stage: &'static str) -> ProtocolError {
    if error.is_timeout() {
        ProtocolError::Timeout { stage }
    } else {
        ProtocolError::Network {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl OrderChannel for SupplierClient {
    async fn procure(&self, item: &str, quantity: u32) -> Result<ProcurementReceipt> {
        let mut attempt = OrderAttempt::new(item, quantity);
        match self.drive(&mut attempt).await {
            Ok(receipt) => Ok(receipt),
            Err(error) => {
                // Failed is legal from every live phase
                let _ = attempt.advance(AttemptState::Failed);
                warn!(item, quantity, %error, "procurement attempt failed");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use smartshelf_settlement::InMemoryChain;

    fn chain() -> Arc<dyn SettlementChannel> {
        Arc::new(InMemoryChain::funded(
            Address("0xagent".to_string()),
            dec!(0.01),
        ))
    }

    #[test]
    fn base_url_is_normalized() {
        let client = SupplierClient::new("http://localhost:3001/", chain()).unwrap();
        assert_eq!(client.base_url, "http://localhost:3001");
    }

    #[tokio::test]
    async fn unreachable_supplier_is_a_transport_error() {
        // Nothing listens on this port
        let client = SupplierClient::new("http://127.0.0.1:1", chain()).unwrap();
        let result = client.procure("Basmati Rice", 20).await;
        assert!(matches!(
            result,
            Err(ProtocolError::Network { .. }) | Err(ProtocolError::Timeout { .. })
        ));
    }
}
