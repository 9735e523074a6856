//! Faction-aware combat - who fights whom, and how hits land
//!
//! Allegiance is derived from loyalty every perception cycle, so a villager
//! that turns Rebel is immediately a valid target for its former allies.

pub mod attack;
pub mod combatant;
pub mod damage;
pub mod faction;
pub mod targeting;

pub use attack::{AttackOutcome, Attacker, AttackerKind};
pub use combatant::{CombatProfile, Combatant};
pub use damage::{DamageEvent, DamageIntake, DamageReport};
pub use faction::{is_friendly_fire, Allegiance, Perspective, TargetSide};
pub use targeting::{
    combat_efficiency, effective_detection_radius, is_eligible_target, perception_interval,
    select_target, TargetCandidate,
};
