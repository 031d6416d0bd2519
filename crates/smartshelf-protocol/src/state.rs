//! Order attempt state machine
//!
//! Phases advance strictly forward; `Failed` is reachable from any
//! non-terminal phase and both `Fulfilled` and `Failed` are terminal.

use smartshelf_types::{Invoice, SettlementProof};

use crate::{ProtocolError, Result};

/// Phase of one order attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// First round trip sent, no challenge seen yet
    Requested,
    /// 402 challenge received, invoice in hand
    ChallengeIssued,
    /// Settlement submitted to the chain
    Settling,
    /// Proof accepted by the supplier
    Verified,
    Fulfilled,
    Failed,
}

impl AttemptState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptState::Fulfilled | AttemptState::Failed)
    }

    fn can_advance_to(self, next: AttemptState) -> bool {
        use AttemptState::*;
        matches!(
            (self, next),
            (Requested, ChallengeIssued)
                | (ChallengeIssued, Settling)
                | (Settling, Verified)
                | (Verified, Fulfilled)
        ) || (next == Failed && !self.is_terminal())
    }
}

impl std::fmt::Display for AttemptState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttemptState::Requested => "requested",
            AttemptState::ChallengeIssued => "challenge-issued",
            AttemptState::Settling => "settling",
            AttemptState::Verified => "verified",
            AttemptState::Fulfilled => "fulfilled",
            AttemptState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// One order attempt as tracked by the client while it drives the protocol
#[derive(Debug, Clone)]
pub struct OrderAttempt {
    pub item: String,
    pub quantity: u32,
    state: AttemptState,
    pub invoice: Option<Invoice>,
    pub proof: Option<SettlementProof>,
}

impl OrderAttempt {
    pub fn new(item: impl Into<String>, quantity: u32) -> Self {
        Self {
            item: item.into(),
            quantity,
            state: AttemptState::Requested,
            invoice: None,
            proof: None,
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    /// Move to `next`, rejecting transitions the protocol does not allow
    pub fn advance(&mut self, next: AttemptState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(ProtocolError::State {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_advances_in_order() {
        let mut attempt = OrderAttempt::new("Basmati Rice", 20);
        assert_eq!(attempt.state(), AttemptState::Requested);

        attempt.advance(AttemptState::ChallengeIssued).unwrap();
        attempt.advance(AttemptState::Settling).unwrap();
        attempt.advance(AttemptState::Verified).unwrap();
        attempt.advance(AttemptState::Fulfilled).unwrap();
        assert!(attempt.state().is_terminal());
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let mut attempt = OrderAttempt::new("Basmati Rice", 20);
        let result = attempt.advance(AttemptState::Verified);
        assert!(matches!(result, Err(ProtocolError::State { .. })));
        // State is unchanged after a rejected transition
        assert_eq!(attempt.state(), AttemptState::Requested);
    }

    #[test]
    fn failure_is_reachable_from_any_live_phase() {
        for reach in [
            AttemptState::Requested,
            AttemptState::ChallengeIssued,
            AttemptState::Settling,
            AttemptState::Verified,
        ] {
            assert!(reach.can_advance_to(AttemptState::Failed), "{reach}");
        }
    }

    #[test]
    fn terminal_states_cannot_move() {
        let mut attempt = OrderAttempt::new("Basmati Rice", 20);
        attempt.advance(AttemptState::Failed).unwrap();
        assert!(attempt.advance(AttemptState::ChallengeIssued).is_err());
        assert!(attempt.advance(AttemptState::Failed).is_err());
    }
}
