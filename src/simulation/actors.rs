//! Non-villager combatants: wave enemies and the player

use std::sync::Arc;

use crate::combat::combatant::Combatant;
use crate::core::types::{EntityId, Vec2};
use crate::waves::enemy_type::EnemyType;

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub archetype: Arc<EnemyType>,
    hp: i32,
    pub combatant: Combatant,
}

impl Enemy {
    pub fn spawn(archetype: Arc<EnemyType>, position: Vec2, detection_radius: f32) -> Self {
        let combatant = Combatant::new(position, archetype.profile, detection_radius);
        Self {
            id: EntityId::new(),
            hp: archetype.max_hp,
            archetype,
            combatant,
        }
    }

    pub fn name(&self) -> &str {
        &self.archetype.name
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub(crate) fn take_damage(&mut self, amount: i32) -> i32 {
        let applied = amount.clamp(0, self.hp.max(0));
        self.hp -= applied;
        applied
    }
}

/// The player avatar. Moves and attacks on external input only.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: EntityId,
    pub position: Vec2,
    hp: i32,
    max_hp: i32,
}

impl Player {
    pub fn new(position: Vec2, max_hp: i32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            id: EntityId::new(),
            position,
            hp: max_hp,
            max_hp,
        }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub(crate) fn take_damage(&mut self, amount: i32) -> i32 {
        let applied = amount.clamp(0, self.hp.max(0));
        self.hp -= applied;
        applied
    }
}
