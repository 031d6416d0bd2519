//! SmartShelf Types - Canonical domain types for autonomous procurement
//!
//! This crate contains the foundational types shared across the workspace,
//! with zero dependencies on other smartshelf crates:
//!
//! - Inventory items and stock accounting
//! - Restock recommendations from the decision engine
//! - Invoices, settlement proofs, and fulfilled orders
//! - Fallback-network supplier directory entries
//! - The bounded activity/history ring buffer
//!
//! # Invariants
//!
//! 1. Stock is never negative; a sale against empty stock is a no-op
//! 2. Orders are immutable once recorded
//! 3. A settlement proof is opaque and non-empty
//! 4. History buffers are bounded; the oldest entry is evicted first

pub mod inventory;
pub mod order;
pub mod recommendation;
pub mod ringlog;
pub mod supplier;

pub use inventory::*;
pub use order::*;
pub use recommendation::*;
pub use ringlog::*;
pub use supplier::*;

/// Version of the SmartShelf types schema
pub const TYPES_VERSION: &str = "0.1.0";
