//! SmartShelf Settlement - value transfer behind a capability trait
//!
//! The real signing wallet and RPC endpoint are external collaborators: the
//! agent only needs "send `amount` to `destination`, wait for confirmation,
//! get back a transaction hash usable as a settlement proof". That capability
//! is the `SettlementChannel` trait; `InMemoryChain` is the in-process
//! implementation used by the demo binaries and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

/// Errors that can occur while settling a payment
#[derive(Error, Debug, Clone)]
pub enum SettlementError {
    #[error("Insufficient funds: have {available}, need {required}")]
    InsufficientFunds {
        available: Decimal,
        required: Decimal,
    },

    #[error("Transfer rejected by the chain: {reason}")]
    Rejected { reason: String },

    #[error("Confirmation not observed for {tx_hash}")]
    ConfirmationTimeout { tx_hash: String },

    #[error("RPC unreachable: {message}")]
    Rpc { message: String },
}

pub type Result<T> = std::result::Result<T, SettlementError>;

/// A settlement destination address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transaction hash identifying a submitted transfer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded value transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub tx_hash: TxHash,
    pub from: Address,
    pub to: Address,
    pub amount: Decimal,
    pub submitted_at: DateTime<Utc>,
}

/// Confirmation of an executed transfer
#[derive(Debug, Clone)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub confirmed_at: DateTime<Utc>,
}

/// Capability to move value on the settlement network.
///
/// `transfer` submits and `confirm` awaits finality; `lookup` lets a strict
/// proof verifier check a claimed transaction against the chain's record.
#[async_trait]
pub trait SettlementChannel: Send + Sync {
    /// Submit a transfer of `amount` to `to`, returning its transaction hash
    async fn transfer(&self, to: &Address, amount: Decimal) -> Result<TxHash>;

    /// Wait until the transfer is confirmed.
    ///
    /// The only long-blocking operation in a workflow; callers bound it with
    /// a timeout.
    async fn confirm(&self, tx_hash: &TxHash) -> Result<Confirmation>;

    /// Look up a previously submitted transfer by hash
    async fn lookup(&self, tx_hash: &TxHash) -> Option<Transfer>;
}

/// In-process settlement chain with funded accounts.
///
/// Transaction hashes are synthetic but deterministic in shape (keccak over a
/// per-chain nonce), so proofs look like real ones downstream.
#[derive(Clone)]
pub struct InMemoryChain {
    agent: Address,
    balances: Arc<RwLock<HashMap<Address, Decimal>>>,
    transfers: Arc<RwLock<HashMap<TxHash, Transfer>>>,
    nonce: Arc<RwLock<u64>>,
    /// When set, the next transfer fails with this error (test/fault hook)
    fault: Arc<RwLock<Option<SettlementError>>>,
}

impl InMemoryChain {
    /// Create a chain with the agent's account funded to `funds`
    pub fn funded(agent: Address, funds: Decimal) -> Self {
        let mut balances = HashMap::new();
        balances.insert(agent.clone(), funds);
        Self {
            agent,
            balances: Arc::new(RwLock::new(balances)),
            transfers: Arc::new(RwLock::new(HashMap::new())),
            nonce: Arc::new(RwLock::new(0)),
            fault: Arc::new(RwLock::new(None)),
        }
    }

    /// Arrange for the next transfer to fail
    pub async fn inject_fault(&self, error: SettlementError) {
        *self.fault.write().await = Some(error);
    }

    pub async fn balance(&self, address: &Address) -> Decimal {
        self.balances
            .read()
            .await
            .get(address)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    async fn next_hash(&self) -> TxHash {
        let mut nonce = self.nonce.write().await;
        *nonce += 1;
        let digest = Keccak256::digest(format!("{}:{}", self.agent, *nonce).as_bytes());
        TxHash(format!("0x{}", hex::encode(digest)))
    }
}

#[async_trait]
impl SettlementChannel for InMemoryChain {
    async fn transfer(&self, to: &Address, amount: Decimal) -> Result<TxHash> {
        if let Some(error) = self.fault.write().await.take() {
            return Err(error);
        }

        let mut balances = self.balances.write().await;
        let available = balances.get(&self.agent).copied().unwrap_or(Decimal::ZERO);
        if available < amount {
            return Err(SettlementError::InsufficientFunds {
                available,
                required: amount,
            });
        }

        balances.insert(self.agent.clone(), available - amount);
        *balances.entry(to.clone()).or_insert(Decimal::ZERO) += amount;

        let tx_hash = self.next_hash().await;
        let transfer = Transfer {
            tx_hash: tx_hash.clone(),
            from: self.agent.clone(),
            to: to.clone(),
            amount,
            submitted_at: Utc::now(),
        };
        self.transfers
            .write()
            .await
            .insert(tx_hash.clone(), transfer);

        info!(%tx_hash, %to, %amount, "transfer submitted");
        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: &TxHash) -> Result<Confirmation> {
        let transfers = self.transfers.read().await;
        if transfers.contains_key(tx_hash) {
            Ok(Confirmation {
                tx_hash: tx_hash.clone(),
                confirmed_at: Utc::now(),
            })
        } else {
            Err(SettlementError::ConfirmationTimeout {
                tx_hash: tx_hash.0.clone(),
            })
        }
    }

    async fn lookup(&self, tx_hash: &TxHash) -> Option<Transfer> {
        self.transfers.read().await.get(tx_hash).cloned()
    }
}
