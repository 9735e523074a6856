//! Combat state shared by villagers and enemies

use serde::{Deserialize, Serialize};

use crate::combat::attack::AttackerKind;
use crate::core::types::{EntityId, Vec2};

/// Static combat numbers for a role or enemy archetype
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatProfile {
    pub damage: f32,
    pub attack_range: f32,
    pub cooldown_secs: f32,
    /// World units per second
    pub speed: f32,
    pub attacker: AttackerKind,
}

impl CombatProfile {
    pub fn new(damage: f32, attack_range: f32, cooldown_secs: f32, speed: f32, attacker: AttackerKind) -> Self {
        Self {
            damage,
            attack_range,
            cooldown_secs,
            speed,
            attacker,
        }
    }
}

impl Default for CombatProfile {
    fn default() -> Self {
        Self::new(5.0, 1.5, 1.0, 3.0, AttackerKind::Melee)
    }
}

#[derive(Debug, Clone)]
pub struct Combatant {
    pub position: Vec2,
    /// Effective profile after tier and loyalty scaling
    pub profile: CombatProfile,
    pub detection_radius: f32,
    pub cooldown_remaining: f32,
    pub target: Option<EntityId>,
    perception_countdown: u32,
}

impl Combatant {
    pub fn new(position: Vec2, profile: CombatProfile, detection_radius: f32) -> Self {
        Self {
            position,
            profile,
            detection_radius,
            cooldown_remaining: 0.0,
            target: None,
            perception_countdown: 0,
        }
    }

    pub fn tick_cooldown(&mut self, dt: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
    }

    pub fn ready(&self) -> bool {
        self.cooldown_remaining <= 0.0
    }

    pub(crate) fn start_cooldown(&mut self) {
        self.cooldown_remaining = self.profile.cooldown_secs;
    }

    /// True on the ticks where a perception scan runs: the first call,
    /// then every `interval` calls.
    pub fn perception_due(&mut self, interval: u32) -> bool {
        if self.perception_countdown == 0 {
            self.perception_countdown = interval.max(1) - 1;
            true
        } else {
            self.perception_countdown -= 1;
            false
        }
    }

    /// Swap to a new target. Returns true only when it actually changed.
    pub fn retarget(&mut self, target: Option<EntityId>) -> bool {
        if self.target == target {
            return false;
        }
        self.target = target;
        true
    }
}
