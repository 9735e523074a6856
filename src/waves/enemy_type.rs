//! Enemy archetypes referenced by the composition generator

use serde::{Deserialize, Serialize};

use crate::combat::attack::AttackerKind;
use crate::combat::combatant::CombatProfile;

/// Difficulty class, selects the weight-adjustment rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatTier {
    Easy,
    Medium,
    Hard,
    Elite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyType {
    pub name: String,
    pub tier: ThreatTier,
    /// Budget points spent to include one of these
    pub difficulty_cost: u32,
    /// Communal power dropped on death
    pub power_value: u32,
    pub spawn_weight: f32,
    pub min_wave_to_appear: u32,
    pub max_hp: i32,
    pub profile: CombatProfile,
}

impl EnemyType {
    pub fn is_easy(&self) -> bool {
        self.tier == ThreatTier::Easy
    }
}

/// Built-in roster
pub fn default_roster() -> Vec<EnemyType> {
    vec![
        EnemyType {
            name: "Goblin".into(),
            tier: ThreatTier::Easy,
            difficulty_cost: 1,
            power_value: 1,
            spawn_weight: 1.0,
            min_wave_to_appear: 1,
            max_hp: 30,
            profile: CombatProfile::new(4.0, 1.5, 1.0, 3.5, AttackerKind::Melee),
        },
        EnemyType {
            name: "Wolf".into(),
            tier: ThreatTier::Easy,
            difficulty_cost: 2,
            power_value: 1,
            spawn_weight: 0.8,
            min_wave_to_appear: 1,
            max_hp: 40,
            profile: CombatProfile::new(6.0, 1.2, 0.8, 5.0, AttackerKind::Melee),
        },
        EnemyType {
            name: "Orc Archer".into(),
            tier: ThreatTier::Medium,
            difficulty_cost: 3,
            power_value: 2,
            spawn_weight: 0.7,
            min_wave_to_appear: 2,
            max_hp: 50,
            profile: CombatProfile::new(7.0, 7.0, 1.5, 3.0, AttackerKind::Ranged),
        },
        EnemyType {
            name: "Orc Brute".into(),
            tier: ThreatTier::Medium,
            difficulty_cost: 4,
            power_value: 3,
            spawn_weight: 0.6,
            min_wave_to_appear: 3,
            max_hp: 90,
            profile: CombatProfile::new(12.0, 1.8, 1.4, 2.8, AttackerKind::Melee),
        },
        EnemyType {
            name: "Warlock".into(),
            tier: ThreatTier::Hard,
            difficulty_cost: 6,
            power_value: 4,
            spawn_weight: 0.5,
            min_wave_to_appear: 4,
            max_hp: 70,
            profile: CombatProfile::new(
                10.0,
                8.0,
                2.0,
                2.5,
                AttackerKind::Caster { splash_radius: 3.0 },
            ),
        },
        EnemyType {
            name: "Troll".into(),
            tier: ThreatTier::Hard,
            difficulty_cost: 8,
            power_value: 5,
            spawn_weight: 0.5,
            min_wave_to_appear: 5,
            max_hp: 220,
            profile: CombatProfile::new(20.0, 2.0, 2.0, 2.2, AttackerKind::Melee),
        },
        EnemyType {
            name: "Siege Ogre".into(),
            tier: ThreatTier::Elite,
            difficulty_cost: 15,
            power_value: 10,
            spawn_weight: 0.4,
            min_wave_to_appear: 10,
            max_hp: 500,
            profile: CombatProfile::new(35.0, 2.5, 2.5, 2.0, AttackerKind::Melee),
        },
    ]
}
