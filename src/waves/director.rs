//! Wave lifecycle: compose on Night entry, pace spawns, close out

use std::sync::Arc;

use rand::Rng;

use crate::core::config::WaveConfiguration;
use crate::core::types::Vec2;
use crate::waves::composition::{ThreatComposer, WaveComposition};
use crate::waves::enemy_type::EnemyType;
use crate::waves::schedule::{SpawnSchedule, SpawnTiming};

#[derive(Debug, Clone)]
pub struct WaveDirector {
    roster: Vec<Arc<EnemyType>>,
    composer: ThreatComposer,
    timing: SpawnTiming,
    spawn_points: Vec<Vec2>,
    schedule: Option<SpawnSchedule>,
    current_wave: u32,
    completed_waves: u32,
}

impl WaveDirector {
    pub fn new(config: &WaveConfiguration, roster: &[EnemyType]) -> Self {
        Self {
            roster: roster.iter().cloned().map(Arc::new).collect(),
            composer: ThreatComposer::new(config),
            timing: SpawnTiming::from_config(config),
            spawn_points: config.spawn_points.clone(),
            schedule: None,
            current_wave: 0,
            completed_waves: 0,
        }
    }

    pub fn roster(&self) -> &[Arc<EnemyType>] {
        &self.roster
    }

    pub fn composer(&self) -> &ThreatComposer {
        &self.composer
    }

    pub fn timing(&self) -> &SpawnTiming {
        &self.timing
    }

    pub fn current_wave(&self) -> u32 {
        self.current_wave
    }

    pub fn completed_waves(&self) -> u32 {
        self.completed_waves
    }

    /// Compose `wave` and queue it for spawning
    pub fn begin_wave<R: Rng + ?Sized>(&mut self, wave: u32, rng: &mut R) -> WaveComposition {
        if let Some(previous) = self.schedule.as_mut() {
            let dropped = previous.clear();
            if dropped > 0 {
                tracing::warn!("wave {} replaced with {} enemies unspawned", self.current_wave, dropped);
            }
        }
        let composition = self.composer.compose(wave, &self.roster, rng);
        self.schedule = Some(SpawnSchedule::new(composition.enemies.clone(), self.spawn_points.clone()));
        self.current_wave = wave;
        composition
    }

    pub fn next_spawn(&mut self) -> Option<(Arc<EnemyType>, Vec2)> {
        self.schedule.as_mut()?.pop_next()
    }

    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.timing.next_delay(rng)
    }

    pub fn pending_spawns(&self) -> usize {
        self.schedule.as_ref().map_or(0, SpawnSchedule::remaining)
    }

    /// True once the queue for the active wave is empty (or there is none)
    pub fn spawning_finished(&self) -> bool {
        self.pending_spawns() == 0
    }

    pub fn wave_active(&self) -> bool {
        self.schedule.is_some()
    }

    /// Close the active wave and tighten spawn timing
    pub fn complete_wave(&mut self) -> bool {
        if self.schedule.take().is_none() {
            return false;
        }
        self.completed_waves += 1;
        self.timing.after_wave_completed();
        tracing::info!(
            "wave {} complete, next spawn interval {:.2}s",
            self.current_wave,
            self.timing.time_between_spawns
        );
        true
    }

    /// Drop the active wave without counting it
    pub fn abort_wave(&mut self) -> usize {
        self.schedule.take().map_or(0, |mut s| s.clear())
    }
}
