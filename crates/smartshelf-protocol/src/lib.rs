//! SmartShelf Protocol - the payment-gated order protocol
//!
//! Two round trips between an agent and a supplier:
//!
//! 1. The agent posts an order request with no proof attached. The supplier
//!    answers with a 402 challenge carrying a priced invoice.
//! 2. The agent settles the invoice on the settlement network and reposts the
//!    identical request with the transaction hash as a bearer proof header.
//!    The supplier verifies the proof, records the order, and fulfills.
//!
//! The crate carries both halves: [`SupplierClient`] drives the agent side of
//! the exchange, [`OrderDesk`] implements the supplier side. The wire bodies
//! and header names live in [`wire`]; the legal order of protocol phases is
//! enforced by [`OrderAttempt`].
//!
//! # Invariants
//!
//! 1. A request without a proof never fulfills; it is always answered with a
//!    challenge
//! 2. One accepted proof produces exactly one ledger entry, no matter how
//!    many times it is submitted
//! 3. The amount charged is the amount quoted on the challenge when the
//!    client echoes the invoice id back

pub mod client;
pub mod desk;
pub mod state;
pub mod verify;
pub mod wire;

use thiserror::Error;

pub use client::{OrderChannel, ProcurementReceipt, SupplierClient};
pub use desk::{BuyOutcome, OrderDesk};
pub use state::{AttemptState, OrderAttempt};
pub use verify::{BearerVerifier, ChainVerifier, ProofVerifier, VerificationError};
pub use wire::{
    BuyStockRequest, FulfillmentBody, OrderEntry, PaymentDetails, PaymentRequiredBody,
    SupplierOrdersBody, INVOICE_ID_HEADER, PAYMENT_PROOF_HEADER,
};

/// Errors that can occur while driving the order protocol
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error(transparent)]
    Settlement(#[from] smartshelf_settlement::SettlementError),

    #[error("Unexpected supplier response: {message}")]
    Response { message: String },

    #[error("Transport failure talking to supplier: {message}")]
    Network { message: String },

    #[error("Protocol stage '{stage}' exceeded its deadline")]
    Timeout { stage: &'static str },

    #[error("Illegal order state transition {from} -> {to}")]
    State { from: AttemptState, to: AttemptState },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
