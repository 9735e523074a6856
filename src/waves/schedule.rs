//! Spawn pacing for the active wave

use std::collections::VecDeque;
use std::sync::Arc;

use rand::Rng;

use crate::core::config::WaveConfiguration;
use crate::core::types::Vec2;
use crate::waves::enemy_type::EnemyType;

/// Delay between spawns. Tightens after every completed wave down to a floor.
#[derive(Debug, Clone)]
pub struct SpawnTiming {
    pub time_between_spawns: f32,
    pub jitter: (f32, f32),
    pub reduction: f32,
    pub floor: f32,
}

impl SpawnTiming {
    pub fn from_config(config: &WaveConfiguration) -> Self {
        Self {
            time_between_spawns: config.time_between_spawns,
            jitter: config.spawn_jitter,
            reduction: config.wave_timing_reduction,
            floor: config.min_time_between_spawns,
        }
    }

    /// Base delay scaled by a jitter factor drawn from `jitter`
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = self.jitter;
        let factor = match (lo.is_finite(), hi.is_finite()) {
            (true, true) if lo < hi => rng.gen_range(lo..hi),
            (true, _) => lo,
            _ => 1.0,
        };
        (self.time_between_spawns * factor).max(0.0)
    }

    pub fn after_wave_completed(&mut self) {
        self.time_between_spawns = (self.time_between_spawns * self.reduction).max(self.floor);
    }
}

/// Enemies still to spawn this wave, handed out round-robin over spawn points
#[derive(Debug, Clone)]
pub struct SpawnSchedule {
    pending: VecDeque<Arc<EnemyType>>,
    spawn_points: Vec<Vec2>,
    next_point: usize,
}

impl SpawnSchedule {
    pub fn new(enemies: Vec<Arc<EnemyType>>, spawn_points: Vec<Vec2>) -> Self {
        Self {
            pending: enemies.into(),
            spawn_points,
            next_point: 0,
        }
    }

    pub fn pop_next(&mut self) -> Option<(Arc<EnemyType>, Vec2)> {
        let enemy = self.pending.pop_front()?;
        let position = if self.spawn_points.is_empty() {
            tracing::warn!("no spawn points configured, spawning {} at origin", enemy.name);
            Vec2::ZERO
        } else {
            let point = self.spawn_points[self.next_point % self.spawn_points.len()];
            self.next_point = (self.next_point + 1) % self.spawn_points.len();
            point
        };
        Some((enemy, position))
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop anything not yet spawned, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}
