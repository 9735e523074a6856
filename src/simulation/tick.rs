//! Tick pipeline
//!
//! clock -> due tasks -> (Night only) perception -> movement -> attacks ->
//! damage -> deaths -> wave progress -> loss checks
//!
//! Everything runs sequentially on one thread; each stage sees the results
//! of the previous one within the same tick.

use ahash::AHashMap;

use crate::combat::attack::{AttackOutcome, Attacker};
use crate::combat::damage::{whole_damage, DamageEvent, DamageIntake, DamageReport};
use crate::combat::faction::{is_friendly_fire, Perspective, TargetSide};
use crate::combat::targeting::{
    combat_efficiency, effective_detection_radius, is_eligible_target, perception_interval, select_target,
    TargetCandidate,
};
use crate::core::error::{Result, SiegeError};
use crate::core::types::{EntityId, Vec2};
use crate::economy::loyalty::LoyaltyState;
use crate::economy::rebellion::{rebel_fraction, rebelling_count};
use crate::phase::events::{SiegeEvent, SiegeEventLog};
use crate::phase::state::{GameOutcome, GamePhase};
use crate::simulation::siege::Siege;

/// Live, combat-eligible entities for one tick in a stable order
/// (player, villagers, enemies) with an id index for lookups
#[derive(Debug, Default)]
struct Roster {
    ordered: Vec<TargetCandidate>,
    index: AHashMap<EntityId, usize>,
}

impl Roster {
    fn insert(&mut self, candidate: TargetCandidate) {
        self.index.insert(candidate.id, self.ordered.len());
        self.ordered.push(candidate);
    }

    fn get(&self, id: &EntityId) -> Option<&TargetCandidate> {
        self.index.get(id).map(|&i| &self.ordered[i])
    }

    fn candidates(&self) -> &[TargetCandidate] {
        &self.ordered
    }
}

impl Siege {
    /// Advance the simulation by `dt` real seconds and return the events
    /// produced. Never fails: per-entity problems are logged and isolated.
    pub fn tick(&mut self, dt: f32) -> SiegeEventLog {
        if !self.is_started() {
            if let Err(e) = self.start() {
                tracing::warn!("failed to enter starting phase: {}", e);
            }
        }
        if self.is_over() {
            return self.events.take_log();
        }

        let dt = self.orchestrator.clock_mut().advance(dt);
        if dt <= 0.0 {
            return self.events.take_log();
        }
        let whole_seconds = self.orchestrator.clock_mut().take_whole_seconds();

        self.phase_tasks();

        if self.orchestrator.phase().combat_active() {
            let roster = self.build_roster();
            self.phase_perception(&roster);
            self.phase_movement(&roster, dt);
            let hits = self.phase_attacks(&roster, dt);
            self.phase_damage(hits);
            self.collect_dead();
            self.phase_wave_progress();
        }

        self.phase_loss_checks(whole_seconds);

        self.events.take_log()
    }

    fn phase_tasks(&mut self) {
        let now = self.orchestrator.now();
        for task in self.orchestrator.tasks.drain_due(now) {
            if let Err(e) = self.run_continuation(task.continuation) {
                tracing::warn!("task {:?} failed: {}", task.continuation, e);
            }
        }
    }

    fn build_roster(&self) -> Roster {
        let mut roster = Roster::default();
        if self.player.is_alive() {
            roster.insert(TargetCandidate {
                id: self.player.id,
                position: self.player.position,
                side: TargetSide::Player,
            });
        }
        for v in self.villagers.iter().filter(|v| v.combat_eligible()) {
            roster.insert(TargetCandidate {
                id: v.id,
                position: v.combatant.position,
                side: TargetSide::Villager(v.loyalty()),
            });
        }
        for e in self.enemies.iter().filter(|e| e.is_alive()) {
            roster.insert(TargetCandidate {
                id: e.id,
                position: e.combatant.position,
                side: TargetSide::Enemy,
            });
        }
        roster
    }

    /// Re-run target selection on each combatant's own cadence. A target
    /// that died or switched sides is dropped immediately.
    fn phase_perception(&mut self, roster: &Roster) {
        let candidates = roster.candidates();
        let tuning = self.config.combat.clone();

        for v in self.villagers.iter_mut().filter(|v| v.combat_eligible()) {
            let perspective = Perspective::Villager(v.loyalty());
            drop_invalid_target(&mut v.combatant.target, perspective, roster);
            if v.combatant.perception_due(perception_interval(perspective, &tuning)) {
                let radius = effective_detection_radius(v.combatant.detection_radius, perspective, &tuning);
                let chosen = select_target(v.id, perspective, v.combatant.position, radius, candidates);
                if v.combatant.retarget(chosen) {
                    tracing::trace!("{} now targets {:?}", v.name, chosen);
                }
            }
        }

        for e in self.enemies.iter_mut().filter(|e| e.is_alive()) {
            let perspective = Perspective::Enemy;
            drop_invalid_target(&mut e.combatant.target, perspective, roster);
            if e.combatant.perception_due(perception_interval(perspective, &tuning)) {
                let chosen = select_target(
                    e.id,
                    perspective,
                    e.combatant.position,
                    e.combatant.detection_radius,
                    candidates,
                );
                e.combatant.retarget(chosen);
            }
        }
    }

    /// Chase targets through the locomotion delegate. Idle enemies march on
    /// the player's position.
    fn phase_movement(&mut self, roster: &Roster, dt: f32) {
        let rally = self.player.position;
        for v in self.villagers.iter_mut().filter(|v| v.combat_eligible()) {
            let Some(target) = v.combatant.target.and_then(|t| roster.get(&t)) else {
                continue;
            };
            let c = &mut v.combatant;
            c.position = self
                .locomotion
                .step(c.position, target.position, c.profile.speed, c.profile.attack_range, dt);
        }
        for e in self.enemies.iter_mut().filter(|e| e.is_alive()) {
            let c = &mut e.combatant;
            let goal = c.target.and_then(|t| roster.get(&t)).map_or(rally, |t| t.position);
            c.position = self
                .locomotion
                .step(c.position, goal, c.profile.speed, c.profile.attack_range, dt);
        }
    }

    /// Resolve every attack that range and cooldown allow. Splash hits
    /// everything near the target except the attacker.
    fn phase_attacks(&mut self, roster: &Roster, dt: f32) -> Vec<DamageEvent> {
        let tuning = self.config.combat.clone();
        let mut hits = Vec::new();

        for v in self.villagers.iter_mut().filter(|v| v.combat_eligible()) {
            v.combatant.tick_cooldown(dt);
            let Some(target) = v.combatant.target.and_then(|t| roster.get(&t)) else {
                continue;
            };
            let perspective = Perspective::Villager(v.loyalty());
            let distance = v.combatant.position.distance(target.position);
            let outcome = v.combatant.try_attack(distance, combat_efficiency(perspective, &tuning));
            resolve_hit(outcome, v.id, target, roster, &mut hits);
        }

        for e in self.enemies.iter_mut().filter(|e| e.is_alive()) {
            e.combatant.tick_cooldown(dt);
            let Some(target) = e.combatant.target.and_then(|t| roster.get(&t)) else {
                continue;
            };
            let distance = e.combatant.position.distance(target.position);
            let outcome = e.combatant.try_attack(distance, 1.0);
            resolve_hit(outcome, e.id, target, roster, &mut hits);
        }

        hits
    }

    fn phase_damage(&mut self, hits: Vec<DamageEvent>) {
        for hit in hits {
            if let Err(e) = self.on_damage(hit.target, hit.amount, hit.source) {
                tracing::debug!("damage dropped: {}", e);
            }
        }
    }

    /// Remove the dead. Enemies drop power; villagers hand their slice back.
    pub(crate) fn collect_dead(&mut self) {
        let mut died = Vec::new();

        let mut drops = 0;
        self.enemies.retain(|e| {
            if e.is_alive() {
                return true;
            }
            drops += e.archetype.power_value;
            died.push(e.id);
            false
        });
        if drops > 0 {
            self.ledger.add_power(drops);
        }

        let mut fallen = Vec::new();
        self.villagers.retain(|v| {
            if v.is_alive() {
                return true;
            }
            fallen.push((v.id, v.name.clone()));
            false
        });
        for (id, name) in fallen {
            self.ledger.close_slice(id);
            self.fallen += 1;
            tracing::info!("{} has fallen", name);
            died.push(id);
        }

        for id in died {
            self.emit(SiegeEvent::CombatantDied { id });
        }

        if !self.player.is_alive() {
            if let Err(e) = self.end_game(GameOutcome::PlayerKilled) {
                tracing::warn!("could not end game: {}", e);
            }
        }
    }

    fn phase_wave_progress(&mut self) {
        let cleared = self.orchestrator.phase() == GamePhase::Night
            && self.director.wave_active()
            && self.director.spawning_finished()
            && self.enemies.is_empty();
        if cleared {
            if let Err(e) = self.finish_wave(false) {
                tracing::warn!("wave completion failed: {}", e);
            }
        }
    }

    /// Mass rebellion is checked every tick; the rebel share once per
    /// simulated second.
    fn phase_loss_checks(&mut self, whole_seconds: u32) {
        if self.is_over() {
            return;
        }

        if self.economy.mass_rebellion_triggered(&self.villagers) {
            let rebelling = rebelling_count(&self.villagers);
            let defected = self.economy.apply_mass_rebellion(&mut self.villagers);
            tracing::warn!(
                "mass rebellion: {} rebelling, {} defected outright",
                rebelling,
                defected.len()
            );
            for &villager in &defected {
                self.emit(SiegeEvent::VillagerRebelled { villager });
                self.emit(SiegeEvent::LoyaltyChanged {
                    villager,
                    loyalty: LoyaltyState::Rebel,
                });
            }
            self.emit(SiegeEvent::MassRebellion { rebelling, defected });
            if let Err(e) = self.end_game(GameOutcome::MassRebellion) {
                tracing::warn!("could not end game: {}", e);
            }
            return;
        }

        if whole_seconds > 0 {
            let fraction = rebel_fraction(&self.villagers);
            if fraction > self.config.settings.rebel_loss_fraction {
                tracing::warn!("{:.0}% of the population is in revolt", fraction * 100.0);
                if let Err(e) = self.end_game(GameOutcome::RebellionLoss) {
                    tracing::warn!("could not end game: {}", e);
                }
            }
        }
    }
}

fn drop_invalid_target(target: &mut Option<EntityId>, perspective: Perspective, roster: &Roster) {
    let valid = target
        .and_then(|t| roster.get(&t))
        .is_some_and(|c| is_eligible_target(perspective, c.side));
    if !valid {
        *target = None;
    }
}

fn resolve_hit(
    outcome: AttackOutcome,
    attacker: EntityId,
    target: &TargetCandidate,
    roster: &Roster,
    hits: &mut Vec<DamageEvent>,
) {
    let AttackOutcome::Hit { damage, splash_radius } = outcome else {
        return;
    };
    hits.push(DamageEvent {
        target: target.id,
        source: Some(attacker),
        amount: damage,
    });
    if let Some(radius) = splash_radius {
        for other in roster.candidates() {
            if other.id == target.id || other.id == attacker {
                continue;
            }
            if within(other.position, target.position, radius) {
                hits.push(DamageEvent {
                    target: other.id,
                    source: Some(attacker),
                    amount: damage,
                });
            }
        }
    }
}

fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) <= radius * radius
}

impl DamageIntake for Siege {
    /// Apply damage to the player, a villager or an enemy. Friendly fire
    /// from the settlement charges the victim villager's discontent.
    fn on_damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) -> Result<DamageReport> {
        let target_side = self.side_of(target).ok_or(SiegeError::EntityNotFound(target))?;
        let source_side = source.and_then(|s| self.side_of(s));
        let amount = whole_damage(amount);

        let (applied, killed) = match target_side {
            TargetSide::Player => {
                let was_alive = self.player.is_alive();
                let applied = self.player.take_damage(amount);
                (applied, was_alive && !self.player.is_alive())
            }
            TargetSide::Villager(_) => {
                let index = self.villager_index(target)?;
                let villager = &mut self.villagers[index];
                let was_alive = villager.is_alive();
                let applied = villager.take_damage(amount);
                (applied, was_alive && !villager.is_alive())
            }
            TargetSide::Enemy => {
                let enemy = self
                    .enemies
                    .iter_mut()
                    .find(|e| e.id == target)
                    .ok_or(SiegeError::EntityNotFound(target))?;
                let was_alive = enemy.is_alive();
                let applied = enemy.take_damage(amount);
                (applied, was_alive && !enemy.is_alive())
            }
        };

        let friendly_fire = applied > 0 && source_side.is_some_and(|s| is_friendly_fire(s, target_side));

        if applied > 0 {
            self.emit(SiegeEvent::Damage {
                target,
                source,
                amount: applied,
            });
        }
        if friendly_fire {
            if let Ok(index) = self.villager_index(target) {
                let penalty = self.economy.constants().friendly_fire_penalty;
                self.apply_discontent(index, penalty);
                tracing::debug!("friendly fire on {}", self.villagers[index].name);
            }
            self.emit(SiegeEvent::FriendlyFire { victim: target, source });
        }

        Ok(DamageReport {
            target,
            applied,
            killed,
            friendly_fire,
        })
    }
}
