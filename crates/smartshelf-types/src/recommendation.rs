//! Restock recommendations produced by the decision engine

use serde::{Deserialize, Serialize};

/// A restock recommendation for one decision cycle.
///
/// Produced fresh per cycle, immutable once returned, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockRecommendation {
    pub should_restock: bool,
    pub recommended_quantity: u32,
    pub reason: String,
    /// 1 (routine) through 10 (critical)
    pub urgency_score: u8,
}

impl RestockRecommendation {
    /// A negative recommendation with a stated reason
    pub fn hold(reason: impl Into<String>) -> Self {
        Self {
            should_restock: false,
            recommended_quantity: 0,
            reason: reason.into(),
            urgency_score: 1,
        }
    }
}
