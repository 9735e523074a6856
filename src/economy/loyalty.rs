//! Loyalty state machine

use serde::{Deserialize, Serialize};

/// Per-villager allegiance. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoyaltyState {
    #[default]
    Loyal,
    /// Telegraph window between breaking and turning on the settlement
    Angry,
    Rebel,
}

impl LoyaltyState {
    /// The only legal successor, if any
    pub fn next(self) -> Option<LoyaltyState> {
        match self {
            LoyaltyState::Loyal => Some(LoyaltyState::Angry),
            LoyaltyState::Angry => Some(LoyaltyState::Rebel),
            LoyaltyState::Rebel => None,
        }
    }

    pub fn is_rebel(self) -> bool {
        matches!(self, LoyaltyState::Rebel)
    }

    pub fn is_loyal(self) -> bool {
        matches!(self, LoyaltyState::Loyal)
    }

    /// Angry or Rebel
    pub fn is_rebelling(self) -> bool {
        !self.is_loyal()
    }
}
