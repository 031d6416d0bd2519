//! Proof verification strategies
//!
//! The desk does not decide how strict proof checking is; it delegates to an
//! injected [`ProofVerifier`]. [`BearerVerifier`] accepts any non-empty proof
//! (possession is sufficient). [`ChainVerifier`] additionally checks the
//! claimed transaction against the settlement chain's record.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use smartshelf_settlement::{SettlementChannel, TxHash};
use smartshelf_types::{Invoice, SettlementProof};
use thiserror::Error;

/// Reasons a proof is refused
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Settlement proof is empty")]
    MissingProof,

    #[error("No transaction {tx_hash} on the settlement chain")]
    UnknownTransaction { tx_hash: String },

    #[error("Transfer went to {actual}, invoice names {expected}")]
    WrongDestination { expected: String, actual: String },

    #[error("Transfer of {paid} does not cover invoiced {invoiced}")]
    Underpaid { invoiced: Decimal, paid: Decimal },
}

/// Capability to judge a settlement proof against an invoice
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    async fn verify(
        &self,
        proof: &SettlementProof,
        invoice: &Invoice,
    ) -> Result<(), VerificationError>;
}

/// Accepts any non-empty proof without consulting the chain
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerVerifier;

#[async_trait]
impl ProofVerifier for BearerVerifier {
    async fn verify(
        &self,
        proof: &SettlementProof,
        _invoice: &Invoice,
    ) -> Result<(), VerificationError> {
        if proof.is_empty() {
            return Err(VerificationError::MissingProof);
        }
        Ok(())
    }
}

/// Checks the proof against the settlement chain: the transaction must exist,
/// pay the invoiced destination, and cover the invoiced amount.
#[derive(Clone)]
pub struct ChainVerifier {
    chain: Arc<dyn SettlementChannel>,
}

impl ChainVerifier {
    pub fn new(chain: Arc<dyn SettlementChannel>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl ProofVerifier for ChainVerifier {
    async fn verify(
        &self,
        proof: &SettlementProof,
        invoice: &Invoice,
    ) -> Result<(), VerificationError> {
        if proof.is_empty() {
            return Err(VerificationError::MissingProof);
        }

        let tx_hash = TxHash(proof.0.clone());
        let transfer = self.chain.lookup(&tx_hash).await.ok_or_else(|| {
            VerificationError::UnknownTransaction {
                tx_hash: tx_hash.0.clone(),
            }
        })?;

        if transfer.to.0 != invoice.destination {
            return Err(VerificationError::WrongDestination {
                expected: invoice.destination.clone(),
                actual: transfer.to.0,
            });
        }

        if transfer.amount < invoice.amount {
            return Err(VerificationError::Underpaid {
                invoiced: invoice.amount,
                paid: transfer.amount,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use smartshelf_settlement::{Address, InMemoryChain};
    use smartshelf_types::InvoiceId;

    fn invoice(amount: Decimal) -> Invoice {
        Invoice {
            amount,
            currency: "ETH".to_string(),
            destination: "0xsupplier".to_string(),
            invoice_id: InvoiceId::new(),
        }
    }

    #[tokio::test]
    async fn bearer_accepts_any_non_empty_proof() {
        let verifier = BearerVerifier;
        let proof = SettlementProof("anything".to_string());
        assert!(verifier.verify(&proof, &invoice(dec!(0.0001))).await.is_ok());
    }

    #[tokio::test]
    async fn bearer_rejects_empty_proof() {
        let verifier = BearerVerifier;
        let proof = SettlementProof(String::new());
        assert!(matches!(
            verifier.verify(&proof, &invoice(dec!(0.0001))).await,
            Err(VerificationError::MissingProof)
        ));
    }

    #[tokio::test]
    async fn chain_verifier_accepts_a_real_payment() {
        let chain = Arc::new(InMemoryChain::funded(
            Address("0xagent".to_string()),
            dec!(0.01),
        ));
        let tx = chain
            .transfer(&Address("0xsupplier".to_string()), dec!(0.0001))
            .await
            .unwrap();

        let verifier = ChainVerifier::new(chain);
        let proof = SettlementProof(tx.0);
        assert!(verifier.verify(&proof, &invoice(dec!(0.0001))).await.is_ok());
    }

    #[tokio::test]
    async fn chain_verifier_rejects_unknown_transaction() {
        let chain = Arc::new(InMemoryChain::funded(
            Address("0xagent".to_string()),
            dec!(0.01),
        ));
        let verifier = ChainVerifier::new(chain);
        let proof = SettlementProof("0xfabricated".to_string());
        assert!(matches!(
            verifier.verify(&proof, &invoice(dec!(0.0001))).await,
            Err(VerificationError::UnknownTransaction { .. })
        ));
    }

    #[tokio::test]
    async fn chain_verifier_rejects_wrong_destination() {
        let chain = Arc::new(InMemoryChain::funded(
            Address("0xagent".to_string()),
            dec!(0.01),
        ));
        let tx = chain
            .transfer(&Address("0xsomeone-else".to_string()), dec!(0.0001))
            .await
            .unwrap();

        let verifier = ChainVerifier::new(chain);
        let proof = SettlementProof(tx.0);
        assert!(matches!(
            verifier.verify(&proof, &invoice(dec!(0.0001))).await,
            Err(VerificationError::WrongDestination { .. })
        ));
    }

    #[tokio::test]
    async fn chain_verifier_rejects_underpayment() {
        let chain = Arc::new(InMemoryChain::funded(
            Address("0xagent".to_string()),
            dec!(0.01),
        ));
        let tx = chain
            .transfer(&Address("0xsupplier".to_string()), dec!(0.00005))
            .await
            .unwrap();

        let verifier = ChainVerifier::new(chain);
        let proof = SettlementProof(tx.0);
        assert!(matches!(
            verifier.verify(&proof, &invoice(dec!(0.0001))).await,
            Err(VerificationError::Underpaid { .. })
        ));
    }
}
