//! Simulation root
//!
//! One `Siege` owns one instance of every subsystem and passes references
//! explicitly. All mutation goes through its methods; external collaborators
//! (UI, spawner visuals, input) read state, raise inputs, or subscribe to
//! the event bus.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::combat::damage::{DamageIntake, DamageReport};
use crate::combat::faction::TargetSide;
use crate::core::config::SiegeConfig;
use crate::core::error::{Result, SiegeError};
use crate::core::types::{EntityId, Vec2};
use crate::economy::engine::{AllocationResult, DiscontentChange, EconomyEngine};
use crate::economy::ledger::ResourceLedger;
use crate::economy::loyalty::LoyaltyState;
use crate::economy::villager::{Role, Villager};
use crate::phase::events::{EventBus, SiegeEvent, SiegeEventLog, SubscriberId};
use crate::phase::orchestrator::PhaseOrchestrator;
use crate::phase::state::{GameOutcome, GamePhase};
use crate::phase::tasks::{Continuation, TaskScope};
use crate::simulation::actors::{Enemy, Player};
use crate::simulation::locomotion::{Locomotion, StraightLine};
use crate::waves::director::WaveDirector;

pub struct Siege {
    pub(crate) config: SiegeConfig,
    pub(crate) orchestrator: PhaseOrchestrator,
    pub(crate) economy: EconomyEngine,
    pub(crate) ledger: ResourceLedger,
    pub(crate) villagers: Vec<Villager>,
    pub(crate) enemies: Vec<Enemy>,
    pub(crate) player: Player,
    pub(crate) director: WaveDirector,
    pub(crate) events: EventBus,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) locomotion: Box<dyn Locomotion>,
    pub(crate) fallen: usize,
    started: bool,
}

impl Siege {
    /// Build a siege from configuration. Configuration problems are repaired
    /// with safe defaults and logged; they never prevent construction.
    pub fn new(mut config: SiegeConfig) -> Self {
        config.sanitize();
        let settings = &config.settings;

        let orchestrator = PhaseOrchestrator::new(GamePhase::initial(settings.starting_phase), settings.max_waves);
        let economy = EconomyEngine::new(config.discontent.clone(), config.combat.clone());
        let ledger = ResourceLedger::new(settings.starting_power, settings.starting_food);
        let director = WaveDirector::new(&config.waves, &config.enemies);
        let player = Player::new(Vec2::ZERO, settings.player_max_hp);
        let rng = ChaCha8Rng::seed_from_u64(settings.seed);

        Self {
            config,
            orchestrator,
            economy,
            ledger,
            villagers: Vec::new(),
            enemies: Vec::new(),
            player,
            director,
            events: EventBus::new(),
            rng,
            locomotion: Box::new(StraightLine),
            fallen: 0,
            started: false,
        }
    }

    /// Replace the movement delegate
    pub fn with_locomotion(mut self, locomotion: impl Locomotion + 'static) -> Self {
        self.locomotion = Box::new(locomotion);
        self
    }

    /// Enter the starting phase. Called automatically by the first `tick`.
    pub fn start(&mut self) -> Result<SiegeEventLog> {
        if !self.started {
            self.started = true;
            let initial = self.orchestrator.phase();
            tracing::info!(
                "siege starting in {:?} with {} villagers, {} waves",
                initial,
                self.villagers.len(),
                self.orchestrator.max_waves()
            );
            self.enter_phase(initial, true)?;
        }
        Ok(self.events.take_log())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    // ------------------------------------------------------------------
    // Population
    // ------------------------------------------------------------------

    /// Add a villager with an empty ledger slice and the communal food level
    pub fn add_villager(&mut self, name: impl Into<String>, role: Role, position: Vec2) -> EntityId {
        let mut villager = Villager::new(name, role, position, &self.config.combat);
        self.economy.set_food(&mut villager, self.ledger.food_percentage());
        self.ledger.open_slice(villager.id);
        let id = villager.id;
        self.villagers.push(villager);
        id
    }

    /// Remove a villager; its allocated power returns to the pool
    pub fn remove_villager(&mut self, id: EntityId) -> Result<Villager> {
        let index = self.villager_index(id)?;
        self.ledger.close_slice(id);
        Ok(self.villagers.remove(index))
    }

    // ------------------------------------------------------------------
    // Economy inputs
    // ------------------------------------------------------------------

    pub fn allocate_power(&mut self, id: EntityId, amount: i32) -> Result<AllocationResult> {
        let index = self.villager_index(id)?;
        let result = self
            .economy
            .allocate_power(&mut self.ledger, &mut self.villagers[index], amount)?;
        if result.tier_before != result.tier_after {
            self.emit(SiegeEvent::TierChanged {
                villager: id,
                from: result.tier_before,
                to: result.tier_after,
            });
        }
        Ok(result)
    }

    /// Set the communal food level and hand it to every villager
    pub fn set_food_percentage(&mut self, food: f32) {
        self.ledger.set_food_percentage(food);
        let level = self.ledger.food_percentage();
        for villager in self.villagers.iter_mut() {
            self.economy.set_food(villager, level);
        }
    }

    pub fn set_villager_food(&mut self, id: EntityId, food: f32) -> Result<()> {
        let index = self.villager_index(id)?;
        self.economy.set_food(&mut self.villagers[index], food);
        Ok(())
    }

    /// A villager's structure fell: no combat until rebuilt, plus a penalty
    pub fn structure_destroyed(&mut self, id: EntityId) -> Result<DiscontentChange> {
        let index = self.villager_index(id)?;
        let villager = &mut self.villagers[index];
        villager.stats.is_active = false;
        villager.combatant.target = None;
        tracing::info!("structure of {} destroyed", villager.name);
        let penalty = self.economy.constants().structure_destroyed_penalty;
        Ok(self.apply_discontent(index, penalty))
    }

    pub fn structure_rebuilt(&mut self, id: EntityId) -> Result<()> {
        let index = self.villager_index(id)?;
        self.villagers[index].stats.is_active = true;
        Ok(())
    }

    /// Player strike from outside the core, routed through damage intake
    pub fn player_attack(&mut self, target: EntityId, amount: f32) -> Result<DamageReport> {
        if !self.player.is_alive() {
            return Err(SiegeError::EntityNotFound(self.player.id));
        }
        let source = self.player.id;
        let report = self.on_damage(target, amount, Some(source))?;
        self.collect_dead();
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Phase control
    // ------------------------------------------------------------------

    /// End the current wave now: cancel spawning, remove every enemy and
    /// move to NightToDay. Returns false outside Night.
    pub fn force_next_wave(&mut self) -> Result<bool> {
        if self.orchestrator.phase() != GamePhase::Night {
            return Ok(false);
        }
        self.orchestrator.tasks.cancel_scope(TaskScope::Night);
        let removed = self.enemies.len() + self.director.pending_spawns();
        self.enemies.clear();
        tracing::info!("wave {} forced to end, {} enemies removed", self.orchestrator.wave_index(), removed);
        self.finish_wave(true)?;
        Ok(true)
    }

    /// Close the current transition window immediately. Returns false
    /// when not in a transition.
    pub fn skip_transition(&mut self) -> Result<bool> {
        let phase = self.orchestrator.phase();
        if !phase.is_transition() {
            return Ok(false);
        }
        self.orchestrator.tasks.cancel_scope(TaskScope::Transition);
        self.run_continuation(Continuation::TransitionComplete(phase))?;
        Ok(true)
    }

    /// Finish the day early
    pub fn end_day(&mut self) -> Result<bool> {
        if self.orchestrator.phase() != GamePhase::Day {
            return Ok(false);
        }
        self.orchestrator.tasks.cancel_scope(TaskScope::Day);
        self.transition_to(GamePhase::DayToNight)?;
        Ok(true)
    }

    pub fn pause(&mut self) -> Result<()> {
        if let Some(change) = self.orchestrator.pause()? {
            self.emit(SiegeEvent::PhaseChanged {
                previous: change.previous,
                next: change.next,
            });
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if let Some(change) = self.orchestrator.resume()? {
            self.emit(SiegeEvent::PhaseChanged {
                previous: change.previous,
                next: change.next,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Allegiance query; false for unknown ids and non-villagers
    pub fn is_rebel(&self, id: EntityId) -> bool {
        self.villager(id).is_some_and(Villager::is_rebel)
    }

    pub fn is_loyal(&self, id: EntityId) -> bool {
        self.villager(id).is_some_and(Villager::is_loyal)
    }

    pub fn loyalty(&self, id: EntityId) -> Option<LoyaltyState> {
        self.villager(id).map(Villager::loyalty)
    }

    pub fn villager(&self, id: EntityId) -> Option<&Villager> {
        self.villagers.iter().find(|v| v.id == id)
    }

    pub fn villagers(&self) -> &[Villager] {
        &self.villagers
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn config(&self) -> &SiegeConfig {
        &self.config
    }

    pub fn director(&self) -> &WaveDirector {
        &self.director
    }

    pub fn phase(&self) -> GamePhase {
        self.orchestrator.phase()
    }

    pub fn wave(&self) -> u32 {
        self.orchestrator.wave_index()
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.orchestrator.outcome()
    }

    pub fn is_over(&self) -> bool {
        self.orchestrator.is_over()
    }

    pub fn now(&self) -> f64 {
        self.orchestrator.now()
    }

    pub fn fallen(&self) -> usize {
        self.fallen
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&SiegeEvent) + 'static) -> SubscriberId {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.events.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Internals shared by transitions and the tick pipeline
    // ------------------------------------------------------------------

    pub(crate) fn emit(&mut self, event: SiegeEvent) {
        let tick = self.orchestrator.clock().current_tick();
        self.events.emit(tick, event);
    }

    pub(crate) fn villager_index(&self, id: EntityId) -> Result<usize> {
        self.villagers
            .iter()
            .position(|v| v.id == id)
            .ok_or(SiegeError::EntityNotFound(id))
    }

    /// How `id` looks to a targeting or friendly-fire check
    pub(crate) fn side_of(&self, id: EntityId) -> Option<TargetSide> {
        if id == self.player.id {
            return Some(TargetSide::Player);
        }
        if let Some(v) = self.villager(id) {
            return Some(TargetSide::Villager(v.loyalty()));
        }
        self.enemies.iter().any(|e| e.id == id).then_some(TargetSide::Enemy)
    }

    /// Route a discontent change through the engine and start the telegraph
    /// if it tipped the villager into rebellion
    pub(crate) fn apply_discontent(&mut self, index: usize, amount: f32) -> DiscontentChange {
        let change = self.economy.add_discontent(&mut self.villagers[index], amount);
        if change.rebellion_started {
            let id = self.villagers[index].id;
            self.rebellion_started(id);
        }
        change
    }

    /// Villager just went Angry: announce it and start the telegraph window
    pub(crate) fn rebellion_started(&mut self, id: EntityId) {
        let resume_at = self.orchestrator.now() + self.economy.constants().angry_telegraph_secs as f64;
        self.orchestrator
            .tasks
            .schedule(resume_at, Continuation::RebellionTelegraph(id), TaskScope::Rebellion);
        if let Some(v) = self.villager(id) {
            tracing::info!("{} ({:?}) is angry and will rebel", v.name, v.role);
        }
        self.emit(SiegeEvent::VillagerAngered { villager: id });
        self.emit(SiegeEvent::LoyaltyChanged {
            villager: id,
            loyalty: LoyaltyState::Angry,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn siege() -> Siege {
        Siege::new(SiegeConfig::default())
    }

    #[test]
    fn test_add_villager_opens_slice_with_food() {
        let mut siege = siege();
        siege.set_food_percentage(0.6);
        let id = siege.add_villager("Ada", Role::Farmer, Vec2::ZERO);

        assert!(siege.ledger().has_slice(id));
        assert!((siege.villager(id).unwrap().stats().food() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_allocation_capped_by_pool() {
        let mut siege = siege();
        let a = siege.add_villager("a", Role::Captain, Vec2::ZERO);
        let b = siege.add_villager("b", Role::Mage, Vec2::ZERO);
        let c = siege.add_villager("c", Role::Builder, Vec2::ZERO);

        // Pool of 10: 4 + 4 + 2
        assert_eq!(siege.allocate_power(a, 9).unwrap().granted, 4);
        assert_eq!(siege.allocate_power(b, 4).unwrap().granted, 4);
        assert_eq!(siege.allocate_power(c, 4).unwrap().granted, 2);
        assert_eq!(siege.ledger().unallocated_power(), 0);
    }

    #[test]
    fn test_remove_villager_returns_power() {
        let mut siege = siege();
        let a = siege.add_villager("a", Role::Captain, Vec2::ZERO);
        siege.allocate_power(a, 4).unwrap();

        siege.remove_villager(a).unwrap();

        assert_eq!(siege.ledger().unallocated_power(), 10);
        assert!(siege.villager(a).is_none());
    }

    #[test]
    fn test_unknown_villager_errors() {
        let mut siege = siege();
        let ghost = EntityId::new();
        assert!(matches!(siege.allocate_power(ghost, 2), Err(SiegeError::EntityNotFound(_))));
        assert!(!siege.is_rebel(ghost));
        assert!(!siege.is_loyal(ghost));
    }

    #[test]
    fn test_structure_destroyed_disables_and_penalizes() {
        let mut siege = siege();
        let id = siege.add_villager("Bram", Role::Builder, Vec2::ZERO);

        let change = siege.structure_destroyed(id).unwrap();

        assert_eq!(change.after, 15.0);
        assert!(!siege.villager(id).unwrap().combat_eligible());
        siege.structure_rebuilt(id).unwrap();
        assert!(siege.villager(id).unwrap().combat_eligible());
    }

    #[test]
    fn test_skip_and_end_day_outside_their_phase() {
        let mut siege = siege();
        siege.start().unwrap();
        assert_eq!(siege.phase(), GamePhase::Day);
        assert!(!siege.skip_transition().unwrap());
        assert!(!siege.force_next_wave().unwrap());
    }
}
