//! Faction-aware target selection
//!
//! - Rebel villagers: the player and Loyal villagers
//! - Loyal/Angry villagers: enemies and Rebel villagers
//! - Enemies: the player and Loyal/Angry villagers
//!
//! Nearest eligible candidate inside the detection radius wins; exact ties
//! go to the first candidate seen.

use crate::combat::faction::{Perspective, TargetSide};
use crate::core::config::CombatTuning;
use crate::core::types::{EntityId, Vec2};
use crate::economy::loyalty::LoyaltyState;

/// A live, targetable entity as seen during one perception pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub id: EntityId,
    pub position: Vec2,
    pub side: TargetSide,
}

pub fn is_eligible_target(perspective: Perspective, side: TargetSide) -> bool {
    match perspective {
        Perspective::Villager(LoyaltyState::Rebel) => {
            matches!(side, TargetSide::Player | TargetSide::Villager(LoyaltyState::Loyal))
        }
        Perspective::Villager(_) => {
            matches!(side, TargetSide::Enemy | TargetSide::Villager(LoyaltyState::Rebel))
        }
        Perspective::Enemy => matches!(
            side,
            TargetSide::Player | TargetSide::Villager(LoyaltyState::Loyal | LoyaltyState::Angry)
        ),
    }
}

/// Nearest eligible candidate within `radius`, never `seeker` itself
pub fn select_target(
    seeker: EntityId,
    perspective: Perspective,
    origin: Vec2,
    radius: f32,
    candidates: &[TargetCandidate],
) -> Option<EntityId> {
    let mut best: Option<EntityId> = None;
    let mut best_distance = f32::INFINITY;

    for candidate in candidates {
        if candidate.id == seeker || !is_eligible_target(perspective, candidate.side) {
            continue;
        }
        let distance = origin.distance(candidate.position);
        if distance <= radius && distance < best_distance {
            best = Some(candidate.id);
            best_distance = distance;
        }
    }

    best
}

/// Detection radius after the Angry efficiency penalty
pub fn effective_detection_radius(base: f32, perspective: Perspective, tuning: &CombatTuning) -> f32 {
    match perspective {
        Perspective::Villager(LoyaltyState::Angry) => base * tuning.angry_combat_efficiency,
        _ => base,
    }
}

/// Ticks between perception scans; Angry villagers are sluggish
pub fn perception_interval(perspective: Perspective, tuning: &CombatTuning) -> u32 {
    match perspective {
        Perspective::Villager(LoyaltyState::Angry) => tuning.angry_perception_interval_ticks,
        _ => tuning.perception_interval_ticks,
    }
}

/// Damage multiplier for the attacker's current state
pub fn combat_efficiency(perspective: Perspective, tuning: &CombatTuning) -> f32 {
    match perspective {
        Perspective::Villager(LoyaltyState::Angry) => tuning.angry_combat_efficiency,
        _ => 1.0,
    }
}
