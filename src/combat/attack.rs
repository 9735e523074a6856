//! Attack capability per archetype
//!
//! Archetypes are a tagged variant rather than a type hierarchy; each
//! variant decides how a hit lands once range and cooldown allow it.

use serde::{Deserialize, Serialize};

use crate::combat::combatant::Combatant;

/// Ranged attackers lose accuracy when the target is this close
pub const POINT_BLANK_RANGE: f32 = 1.5;
pub const POINT_BLANK_MULTIPLIER: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackerKind {
    Melee,
    Ranged,
    /// Hits everything within `splash_radius` of the target, allies included
    Caster { splash_radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackOutcome {
    Hit { damage: f32, splash_radius: Option<f32> },
    OutOfRange,
    CoolingDown,
}

impl AttackOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, AttackOutcome::Hit { .. })
    }
}

impl AttackerKind {
    /// Damage delivered by a strike that is already known to be in range
    pub fn strike(&self, damage: f32, distance: f32) -> AttackOutcome {
        match *self {
            AttackerKind::Melee => AttackOutcome::Hit {
                damage,
                splash_radius: None,
            },
            AttackerKind::Ranged => {
                let damage = if distance < POINT_BLANK_RANGE {
                    damage * POINT_BLANK_MULTIPLIER
                } else {
                    damage
                };
                AttackOutcome::Hit {
                    damage,
                    splash_radius: None,
                }
            }
            AttackerKind::Caster { splash_radius } => AttackOutcome::Hit {
                damage,
                splash_radius: Some(splash_radius),
            },
        }
    }
}

pub trait Attacker {
    /// Attempt an attack on a target `distance` away. `efficiency` scales
    /// damage (below 1 for Angry villagers).
    fn try_attack(&mut self, distance: f32, efficiency: f32) -> AttackOutcome;
}

impl Attacker for Combatant {
    fn try_attack(&mut self, distance: f32, efficiency: f32) -> AttackOutcome {
        if distance > self.profile.attack_range {
            return AttackOutcome::OutOfRange;
        }
        if !self.ready() {
            return AttackOutcome::CoolingDown;
        }
        self.start_cooldown();
        let damage = self.profile.damage * efficiency.clamp(0.0, 1.0);
        self.profile.attacker.strike(damage, distance)
    }
}
