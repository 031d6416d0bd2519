//! SmartShelf Advisor - the restock decision engine
//!
//! The advisor abstraction lets the watcher optionally consult an external
//! advisory service while keeping deterministic behavior as the default. A
//! single advisory failure or timeout falls back immediately to the fixed
//! heuristic; the watcher is never blocked and never sees an error.

pub mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use smartshelf_types::RestockRecommendation;
use thiserror::Error;
use tracing::warn;

pub use http::{HttpAdvisor, HttpAdvisorConfig};

/// The advisory call failed or timed out; recovered locally via the heuristic
#[derive(Error, Debug)]
pub enum AdvisoryUnavailable {
    #[error("Advisory request failed: {message}")]
    Request { message: String },

    #[error("Advisory response was not a valid recommendation: {message}")]
    InvalidResponse { message: String },

    #[error("Advisory call exceeded {seconds}s")]
    Timeout { seconds: u64 },
}

pub type Result<T> = std::result::Result<T, AdvisoryUnavailable>;

/// Stock situation handed to the decision engine for one cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub item: String,
    pub unit: String,
    pub stock: u32,
    pub threshold: u32,
    /// Sales observed in the recent activity window
    pub recent_sales: usize,
}

/// Capability to produce a restock recommendation.
///
/// Best effort, one shot: implementations make a single external call with
/// no retry.
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    async fn recommend(&self, snapshot: &StockSnapshot) -> Result<RestockRecommendation>;
}

/// Advisor mode - determines how decisions are made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvisorMode {
    /// Always use the deterministic heuristic
    #[default]
    Heuristic,
    /// Consult the advisory service, fall back to the heuristic on failure
    Advisory,
}

/// Deterministic fallback policy
#[derive(Debug, Clone)]
pub struct HeuristicPolicy {
    /// Quantity recommended whenever a restock is due
    pub default_quantity: u32,
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self {
            default_quantity: 20,
        }
    }
}

impl HeuristicPolicy {
    /// `should_restock = stock < threshold`; urgency 10 when stock has fallen
    /// below half the threshold, 5 otherwise.
    pub fn recommend(&self, snapshot: &StockSnapshot) -> RestockRecommendation {
        let should_restock = snapshot.stock < snapshot.threshold;
        let urgency_score = if snapshot.stock < snapshot.threshold / 2 {
            10
        } else {
            5
        };
        RestockRecommendation {
            should_restock,
            recommended_quantity: self.default_quantity,
            reason: format!(
                "{} at {} {} against threshold {}; fixed policy",
                snapshot.item, snapshot.stock, snapshot.unit, snapshot.threshold
            ),
            urgency_score,
        }
    }
}

/// The decision engine: advisory provider plus injected fallback policy.
///
/// Stateless between calls.
pub struct StockAdvisor {
    provider: Option<Arc<dyn AdvisoryProvider>>,
    policy: HeuristicPolicy,
    mode: AdvisorMode,
    timeout: Duration,
}

impl StockAdvisor {
    /// A purely deterministic advisor (no external service)
    pub fn heuristic(policy: HeuristicPolicy) -> Self {
        Self {
            provider: None,
            policy,
            mode: AdvisorMode::Heuristic,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// An advisor backed by an external service, with the heuristic injected
    /// as its fallback policy
    pub fn with_provider(provider: Arc<dyn AdvisoryProvider>, policy: HeuristicPolicy) -> Self {
        Self {
            provider: Some(provider),
            policy,
            mode: AdvisorMode::Advisory,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Bound on the advisory round trip
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn mode(&self) -> AdvisorMode {
        self.mode
    }

    /// Produce a recommendation for this cycle. Infallible: advisory failure
    /// falls back to the heuristic and surfaces only as a warning.
    pub async fn recommend(&self, snapshot: &StockSnapshot) -> RestockRecommendation {
        if self.mode == AdvisorMode::Advisory {
            if let Some(provider) = &self.provider {
                match self.try_advisory(provider.as_ref(), snapshot).await {
                    Ok(recommendation) => return recommendation,
                    Err(error) => {
                        warn!(item = %snapshot.item, %error, "advisory unavailable, using heuristic");
                    }
                }
            }
        }

        self.policy.recommend(snapshot)
    }

    /// One bounded advisory attempt, no retry
    pub async fn try_advisory(
        &self,
        provider: &dyn AdvisoryProvider,
        snapshot: &StockSnapshot,
    ) -> Result<RestockRecommendation> {
        let recommendation = tokio::time::timeout(self.timeout, provider.recommend(snapshot))
            .await
            .map_err(|_| AdvisoryUnavailable::Timeout {
                seconds: self.timeout.as_secs(),
            })??;

        if recommendation.should_restock && recommendation.recommended_quantity == 0 {
            return Err(AdvisoryUnavailable::InvalidResponse {
                message: "positive recommendation with zero quantity".to_string(),
            });
        }

        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(stock: u32, threshold: u32) -> StockSnapshot {
        StockSnapshot {
            item: "Basmati Rice".to_string(),
            unit: "kg".to_string(),
            stock,
            threshold,
            recent_sales: 5,
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl AdvisoryProvider for FailingProvider {
        async fn recommend(&self, _snapshot: &StockSnapshot) -> Result<RestockRecommendation> {
            Err(AdvisoryUnavailable::Request {
                message: "quota exhausted".to_string(),
            })
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl AdvisoryProvider for SlowProvider {
        async fn recommend(&self, _snapshot: &StockSnapshot) -> Result<RestockRecommendation> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            unreachable!("the timeout fires first")
        }
    }

    #[tokio::test]
    async fn heuristic_restocks_below_threshold() {
        let advisor = StockAdvisor::heuristic(HeuristicPolicy::default());
        let recommendation = advisor.recommend(&snapshot(8, 10)).await;
        assert!(recommendation.should_restock);
        assert_eq!(recommendation.recommended_quantity, 20);
        assert_eq!(recommendation.urgency_score, 5);
    }

    #[tokio::test]
    async fn heuristic_holds_at_threshold() {
        let advisor = StockAdvisor::heuristic(HeuristicPolicy::default());
        let recommendation = advisor.recommend(&snapshot(10, 10)).await;
        assert!(!recommendation.should_restock);
    }

    #[tokio::test]
    async fn urgency_escalates_below_half_threshold() {
        let advisor = StockAdvisor::heuristic(HeuristicPolicy::default());
        let recommendation = advisor.recommend(&snapshot(4, 10)).await;
        assert_eq!(recommendation.urgency_score, 10);
    }

    #[tokio::test]
    async fn advisory_failure_falls_back_deterministically() {
        let advisor =
            StockAdvisor::with_provider(Arc::new(FailingProvider), HeuristicPolicy::default());

        let low = advisor.recommend(&snapshot(8, 10)).await;
        assert!(low.should_restock);
        assert_eq!(low.recommended_quantity, 20);

        let healthy = advisor.recommend(&snapshot(30, 10)).await;
        assert!(!healthy.should_restock);
    }

    #[tokio::test]
    async fn advisory_timeout_falls_back() {
        let advisor =
            StockAdvisor::with_provider(Arc::new(SlowProvider), HeuristicPolicy::default())
                .with_timeout(Duration::from_millis(20));

        let recommendation = advisor.recommend(&snapshot(8, 10)).await;
        assert!(recommendation.should_restock);
        assert_eq!(recommendation.recommended_quantity, 20);
    }
}
