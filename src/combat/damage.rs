//! Damage intake

use crate::core::error::Result;
use crate::core::types::EntityId;

/// A resolved hit waiting to be applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub target: EntityId,
    pub source: Option<EntityId>,
    pub amount: f32,
}

/// What happened when damage reached its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageReport {
    pub target: EntityId,
    pub applied: i32,
    pub killed: bool,
    pub friendly_fire: bool,
}

/// Single entry point for every attacker into a target's health
pub trait DamageIntake {
    fn on_damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) -> Result<DamageReport>;
}

/// Fractional damage rounds to the nearest whole hit point; negatives are ignored
pub fn whole_damage(amount: f32) -> i32 {
    if amount.is_nan() || amount <= 0.0 {
        0
    } else {
        amount.round() as i32
    }
}
