//! Villager entity - role, provisioning stats, loyalty and combat state

use serde::{Deserialize, Serialize};

use crate::combat::attack::AttackerKind;
use crate::combat::combatant::{CombatProfile, Combatant};
use crate::core::config::CombatTuning;
use crate::core::types::{EntityId, Vec2};
use crate::economy::loyalty::LoyaltyState;

/// Power a single villager can hold in one cycle
pub const MAX_POWER: u32 = 4;

/// Tier bracket for an allocation: 2 at 4+, 1 at 2+, else 0
pub fn tier_for_power(power: u32) -> u8 {
    match power {
        p if p >= 4 => 2,
        p if p >= 2 => 1,
        _ => 0,
    }
}

/// Power needed to sustain a tier
pub fn tier_cost(tier: u8) -> u32 {
    match tier {
        0 => 0,
        1 => 2,
        _ => 4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Captain,
    Farmer,
    Mage,
    Builder,
    Commoner,
}

impl Role {
    /// Every role in declaration order
    pub fn all() -> [Role; 5] {
        [Role::Captain, Role::Farmer, Role::Mage, Role::Builder, Role::Commoner]
    }

    pub fn base_hp(&self) -> i32 {
        match self {
            Role::Captain => 150,
            Role::Farmer => 80,
            Role::Mage => 70,
            Role::Builder => 110,
            Role::Commoner => 60,
        }
    }

    pub fn base_profile(&self) -> CombatProfile {
        match self {
            Role::Captain => CombatProfile::new(18.0, 2.0, 1.0, 4.0, AttackerKind::Melee),
            Role::Farmer => CombatProfile::new(8.0, 6.0, 1.4, 3.5, AttackerKind::Ranged),
            Role::Mage => CombatProfile::new(
                14.0,
                9.0,
                1.8,
                3.0,
                AttackerKind::Caster { splash_radius: 2.5 },
            ),
            Role::Builder => CombatProfile::new(10.0, 1.8, 1.2, 3.5, AttackerKind::Melee),
            Role::Commoner => CombatProfile::new(6.0, 1.5, 1.2, 3.5, AttackerKind::Melee),
        }
    }

    /// Lower sorts first (UI listing and cascade processing order)
    pub fn priority(&self) -> u8 {
        match self {
            Role::Captain => 0,
            Role::Mage => 1,
            Role::Builder => 2,
            Role::Farmer => 3,
            Role::Commoner => 4,
        }
    }
}

/// Provisioning and health. Written only by the economy engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillagerStats {
    pub(crate) power: u32,
    pub(crate) tier: u8,
    pub(crate) food: f32,
    pub(crate) discontent: f32,
    pub(crate) max_hp: i32,
    pub(crate) current_hp: i32,
    pub(crate) is_active: bool,
}

impl VillagerStats {
    fn new(role: Role) -> Self {
        let hp = role.base_hp();
        Self {
            power: 0,
            tier: 0,
            food: 1.0,
            discontent: 0.0,
            max_hp: hp,
            current_hp: hp,
            is_active: true,
        }
    }

    pub fn power(&self) -> u32 {
        self.power
    }

    pub fn tier(&self) -> u8 {
        self.tier
    }

    pub fn food(&self) -> f32 {
        self.food
    }

    pub fn discontent(&self) -> f32 {
        self.discontent
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn current_hp(&self) -> i32 {
        self.current_hp
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Fully provisioned for the current tier
    pub fn well_provisioned(&self) -> bool {
        self.food >= 1.0 && self.power >= tier_cost(self.tier)
    }
}

#[derive(Debug, Clone)]
pub struct Villager {
    pub id: EntityId,
    pub name: String,
    pub role: Role,
    pub(crate) stats: VillagerStats,
    pub(crate) loyalty: LoyaltyState,
    pub combatant: Combatant,
}

impl Villager {
    pub fn new(name: impl Into<String>, role: Role, position: Vec2, tuning: &CombatTuning) -> Self {
        let base = role.base_profile();
        Self {
            id: EntityId::new(),
            name: name.into(),
            role,
            stats: VillagerStats::new(role),
            loyalty: LoyaltyState::Loyal,
            combatant: Combatant::new(position, base, tuning.villager_detection_radius),
        }
    }

    pub fn stats(&self) -> &VillagerStats {
        &self.stats
    }

    pub fn loyalty(&self) -> LoyaltyState {
        self.loyalty
    }

    pub fn is_rebel(&self) -> bool {
        self.loyalty.is_rebel()
    }

    pub fn is_loyal(&self) -> bool {
        self.loyalty.is_loyal()
    }

    pub fn is_alive(&self) -> bool {
        self.stats.current_hp > 0
    }

    /// Alive and with a standing structure
    pub fn combat_eligible(&self) -> bool {
        self.is_alive() && self.stats.is_active
    }

    /// Max HP for a tier: base scaled by `hp_per_tier` per tier
    pub fn max_hp_for_tier(&self, tier: u8, tuning: &CombatTuning) -> i32 {
        let scale = 1.0 + tuning.hp_per_tier * tier as f32;
        (self.role.base_hp() as f32 * scale).round() as i32
    }

    /// Rebuild the effective combat profile from role, tier and loyalty
    pub(crate) fn recompute_combat(&mut self, tuning: &CombatTuning) {
        let base = self.role.base_profile();
        let mut profile = base;
        profile.damage = base.damage * (1.0 + tuning.damage_per_tier * self.stats.tier as f32);
        if self.loyalty.is_rebel() {
            profile.damage *= tuning.rebel_damage_multiplier;
            profile.cooldown_secs *= tuning.rebel_cooldown_multiplier;
        }
        self.combatant.profile = profile;
    }

    /// Apply an absolute HP change, returning the amount actually removed
    pub(crate) fn take_damage(&mut self, amount: i32) -> i32 {
        let applied = amount.clamp(0, self.stats.current_hp.max(0));
        self.stats.current_hp -= applied;
        applied
    }
}
