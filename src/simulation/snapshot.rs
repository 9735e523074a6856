//! Read-only reports for UI polling and the headless runner

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{EntityId, Tick};
use crate::economy::loyalty::LoyaltyState;
use crate::economy::rebellion::rebel_fraction;
use crate::economy::villager::Role;
use crate::phase::state::{GameOutcome, GamePhase};
use crate::simulation::siege::Siege;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub loyal: usize,
    pub angry: usize,
    pub rebel: usize,
    pub fallen: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillagerSnapshot {
    pub id: EntityId,
    pub name: String,
    pub role: Role,
    pub loyalty: LoyaltyState,
    pub power: u32,
    pub tier: u8,
    pub food: f32,
    pub discontent: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiegeSnapshot {
    pub tick: Tick,
    pub elapsed_secs: f64,
    pub phase: GamePhase,
    pub wave: u32,
    pub max_waves: u32,
    pub waves_completed: u32,
    pub outcome: Option<GameOutcome>,
    pub total_power: u32,
    pub unallocated_power: u32,
    pub food_percentage: f32,
    pub population: PopulationSummary,
    pub rebel_fraction: f32,
    pub villagers: Vec<VillagerSnapshot>,
    pub enemies_alive: usize,
    pub pending_spawns: usize,
    pub player_hp: i32,
}

impl SiegeSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Siege {
    pub fn snapshot(&self) -> SiegeSnapshot {
        let mut population = PopulationSummary {
            fallen: self.fallen,
            ..PopulationSummary::default()
        };
        let villagers = self
            .villagers
            .iter()
            .map(|v| {
                match v.loyalty() {
                    LoyaltyState::Loyal => population.loyal += 1,
                    LoyaltyState::Angry => population.angry += 1,
                    LoyaltyState::Rebel => population.rebel += 1,
                }
                let stats = v.stats();
                VillagerSnapshot {
                    id: v.id,
                    name: v.name.clone(),
                    role: v.role,
                    loyalty: v.loyalty(),
                    power: stats.power(),
                    tier: stats.tier(),
                    food: stats.food(),
                    discontent: stats.discontent(),
                    hp: stats.current_hp(),
                    max_hp: stats.max_hp(),
                    active: stats.is_active(),
                }
            })
            .collect();

        SiegeSnapshot {
            tick: self.orchestrator.clock().current_tick(),
            elapsed_secs: self.orchestrator.now(),
            phase: self.orchestrator.phase(),
            wave: self.orchestrator.wave_index(),
            max_waves: self.orchestrator.max_waves(),
            waves_completed: self.director.completed_waves(),
            outcome: self.orchestrator.outcome(),
            total_power: self.ledger.total_power(),
            unallocated_power: self.ledger.unallocated_power(),
            food_percentage: self.ledger.food_percentage(),
            population,
            rebel_fraction: rebel_fraction(&self.villagers),
            villagers,
            enemies_alive: self.enemies.iter().filter(|e| e.is_alive()).count(),
            pending_spawns: self.director.pending_spawns(),
            player_hp: self.player.hp(),
        }
    }
}
