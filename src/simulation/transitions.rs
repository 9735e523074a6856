//! Phase side effects and task continuations
//!
//! Exit Day: settlement pass. Enter Day: power income and the day timer.
//! Enter Night: next wave (or victory). Exit Night: nightly recovery.
//! Transitions: a timed window that ends in the next phase.

use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::economy::loyalty::LoyaltyState;
use crate::phase::events::SiegeEvent;
use crate::phase::state::{GameOutcome, GamePhase};
use crate::phase::tasks::{Continuation, TaskScope};
use crate::simulation::actors::Enemy;
use crate::simulation::siege::Siege;

impl Siege {
    /// Validate, run exit effects of the current phase, switch, then run
    /// enter effects of the new one. Pause edges skip side effects.
    pub(crate) fn transition_to(&mut self, next: GamePhase) -> Result<()> {
        if !self.orchestrator.check_transition(next)? {
            return Ok(());
        }
        let previous = self.orchestrator.phase();
        let suspends = previous == GamePhase::Paused || next == GamePhase::Paused;
        if !suspends {
            self.exit_phase(previous);
        }
        let Some(change) = self.orchestrator.change_state(next)? else {
            return Ok(());
        };
        self.emit(SiegeEvent::PhaseChanged {
            previous: change.previous,
            next: change.next,
        });
        if change.runs_side_effects() {
            self.enter_phase(change.next, false)?;
        }
        Ok(())
    }

    /// End the siege with `outcome`. Later outcomes are ignored.
    pub(crate) fn end_game(&mut self, outcome: GameOutcome) -> Result<()> {
        if self.orchestrator.is_over() {
            return Ok(());
        }
        let previous = self.orchestrator.phase();
        if let Some(change) = self.orchestrator.end_game(outcome)? {
            self.emit(SiegeEvent::PhaseChanged {
                previous,
                next: change.next,
            });
            self.enter_phase(GamePhase::GameOver, false)?;
        }
        Ok(())
    }

    fn exit_phase(&mut self, phase: GamePhase) {
        match phase {
            GamePhase::Day => {
                self.orchestrator.tasks.cancel_scope(TaskScope::Day);
                self.settle_day();
            }
            GamePhase::Night => {
                self.orchestrator.tasks.cancel_scope(TaskScope::Night);
                let recovered = self.economy.recover_all(&mut self.villagers);
                tracing::debug!("{} villagers recovered overnight", recovered);
            }
            GamePhase::DayToNight | GamePhase::NightToDay => {
                self.orchestrator.tasks.cancel_scope(TaskScope::Transition);
            }
            GamePhase::GameOver | GamePhase::Paused => {}
        }
    }

    pub(crate) fn enter_phase(&mut self, phase: GamePhase, initial: bool) -> Result<()> {
        let now = self.orchestrator.now();
        match phase {
            GamePhase::Day => {
                if !initial {
                    let income = self.config.settings.daily_power_income;
                    self.ledger.add_power(income);
                    tracing::info!(
                        "day begins: +{} power, {} unallocated",
                        income,
                        self.ledger.unallocated_power()
                    );
                }
                let resume_at = now + self.config.settings.day_duration_secs as f64;
                self.orchestrator
                    .tasks
                    .schedule(resume_at, Continuation::DayElapsed, TaskScope::Day);
            }
            GamePhase::DayToNight | GamePhase::NightToDay => {
                let resume_at = now + self.config.settings.transition_duration_secs as f64;
                self.orchestrator.tasks.schedule(
                    resume_at,
                    Continuation::TransitionComplete(phase),
                    TaskScope::Transition,
                );
            }
            GamePhase::Night => self.begin_night()?,
            GamePhase::GameOver => {
                for scope in [TaskScope::Day, TaskScope::Transition, TaskScope::Night, TaskScope::Rebellion] {
                    self.orchestrator.tasks.cancel_scope(scope);
                }
                if let Some(outcome) = self.orchestrator.outcome() {
                    tracing::info!(
                        "siege over at wave {}: {:?}",
                        self.orchestrator.wave_index(),
                        outcome
                    );
                    self.emit(SiegeEvent::GameOver { outcome });
                }
            }
            GamePhase::Paused => {}
        }
        Ok(())
    }

    /// Settlement pass over every villager. Missing ledger slices are
    /// skipped inside the engine; the rest of the population still settles.
    fn settle_day(&mut self) {
        let report = self.economy.settle_all(&self.ledger, &mut self.villagers);
        let started: Vec<EntityId> = report.rebellions_started().collect();
        tracing::info!(
            "day settled: {} villagers, {} skipped, {} new rebellions",
            report.changes.len(),
            report.skipped.len(),
            started.len()
        );
        self.emit(SiegeEvent::DaySettled {
            settled: report.changes.len(),
            skipped: report.skipped.len(),
        });
        for id in started {
            self.rebellion_started(id);
        }
    }

    fn begin_night(&mut self) -> Result<()> {
        if !self.orchestrator.advance_wave() {
            tracing::info!("all {} waves survived", self.orchestrator.max_waves());
            return self.end_game(GameOutcome::Victory);
        }
        let wave = self.orchestrator.wave_index();
        let composition = self.director.begin_wave(wave, &mut self.rng);
        self.emit(SiegeEvent::WaveComposed {
            wave,
            budget: composition.budget,
            enemies: composition.enemies,
        });
        let now = self.orchestrator.now();
        self.orchestrator
            .tasks
            .schedule(now, Continuation::SpawnNext, TaskScope::Night);
        Ok(())
    }

    /// Close the active wave and head for NightToDay
    pub(crate) fn finish_wave(&mut self, forced: bool) -> Result<()> {
        let wave = self.orchestrator.wave_index();
        self.director.complete_wave();
        self.emit(SiegeEvent::WaveCompleted { wave, forced });
        self.transition_to(GamePhase::NightToDay)
    }

    pub(crate) fn run_continuation(&mut self, continuation: Continuation) -> Result<()> {
        let phase = self.orchestrator.phase();
        match continuation {
            Continuation::DayElapsed if phase == GamePhase::Day => self.transition_to(GamePhase::DayToNight),
            Continuation::TransitionComplete(from) if from == phase => match from {
                GamePhase::DayToNight => self.transition_to(GamePhase::Night),
                GamePhase::NightToDay => self.transition_to(GamePhase::Day),
                _ => Ok(()),
            },
            Continuation::SpawnNext if phase == GamePhase::Night => {
                self.spawn_next();
                Ok(())
            }
            Continuation::RebellionTelegraph(id) => {
                self.complete_telegraph(id);
                Ok(())
            }
            stale => {
                tracing::debug!("dropping stale task {:?} in {:?}", stale, phase);
                Ok(())
            }
        }
    }

    fn spawn_next(&mut self) {
        let Some((archetype, position)) = self.director.next_spawn() else {
            return;
        };
        let enemy = Enemy::spawn(archetype, position, self.config.combat.enemy_detection_radius);
        tracing::debug!("spawned {} at ({:.1}, {:.1})", enemy.name(), position.x, position.y);
        self.emit(SiegeEvent::EnemySpawned {
            id: enemy.id,
            name: enemy.name().to_string(),
        });
        self.enemies.push(enemy);

        if !self.director.spawning_finished() {
            let delay = self.director.next_delay(&mut self.rng);
            let resume_at = self.orchestrator.now() + delay as f64;
            self.orchestrator
                .tasks
                .schedule(resume_at, Continuation::SpawnNext, TaskScope::Night);
        }
    }

    /// Telegraph over: Angry -> Rebel, then cascades
    fn complete_telegraph(&mut self, id: EntityId) {
        let Ok(index) = self.villager_index(id) else {
            tracing::debug!("telegraph for departed villager {:?}", id);
            return;
        };
        if !self.villagers[index].is_alive() {
            return;
        }
        if !self.economy.complete_rebellion(&mut self.villagers[index]) {
            return;
        }
        self.emit(SiegeEvent::VillagerRebelled { villager: id });
        self.emit(SiegeEvent::LoyaltyChanged {
            villager: id,
            loyalty: LoyaltyState::Rebel,
        });

        let cascade = self.economy.evaluate_cascade(id, &mut self.villagers);
        if cascade.is_empty() {
            return;
        }
        let angered: Vec<EntityId> = cascade.newly_angry().collect();
        for follower in &angered {
            self.rebellion_started(*follower);
        }
        self.emit(SiegeEvent::CascadeTriggered { source: id, angered });
    }
}
