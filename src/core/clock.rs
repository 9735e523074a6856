//! Simulation clock
//!
//! Accumulates scaled seconds. Pausing sets the time scale to zero, which
//! freezes every timer that reads from the clock without touching state.

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    tick: Tick,
    elapsed: f64,
    time_scale: f32,
    /// Fractional seconds not yet reported by `take_whole_seconds`
    second_accumulator: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            tick: 0,
            elapsed: 0.0,
            time_scale: 1.0,
            second_accumulator: 0.0,
        }
    }

    /// Advance by one tick of `dt` real seconds, returning the scaled delta
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.tick += 1;
        let scaled = (dt.max(0.0) * self.time_scale) as f64;
        self.elapsed += scaled;
        self.second_accumulator += scaled;
        scaled as f32
    }

    /// Number of whole simulated seconds completed since the last call
    pub fn take_whole_seconds(&mut self) -> u32 {
        let whole = self.second_accumulator.floor();
        self.second_accumulator -= whole;
        whole as u32
    }

    pub fn now(&self) -> f64 {
        self.elapsed
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn is_frozen(&self) -> bool {
        self.time_scale == 0.0
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
