//! Movement delegate
//!
//! Pathfinding and animation live outside the core. The simulation only
//! asks a `Locomotion` where a combatant ends up after chasing its target
//! for `dt` seconds.

use crate::core::types::Vec2;

pub trait Locomotion {
    /// New position after moving from `position` toward `target` at `speed`,
    /// stopping once within `stop_distance`.
    fn step(&mut self, position: Vec2, target: Vec2, speed: f32, stop_distance: f32, dt: f32) -> Vec2;
}

/// Walks straight at the target. Good enough for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLine;

impl Locomotion for StraightLine {
    fn step(&mut self, position: Vec2, target: Vec2, speed: f32, stop_distance: f32, dt: f32) -> Vec2 {
        let offset = target - position;
        let distance = offset.length();
        let gap = distance - stop_distance;
        if gap <= 0.0 || distance <= f32::EPSILON {
            return position;
        }
        let travel = (speed.max(0.0) * dt.max(0.0)).min(gap);
        position + offset / distance * travel
    }
}

/// Never moves. Useful for scripted scenarios.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stationary;

impl Locomotion for Stationary {
    fn step(&mut self, position: Vec2, _target: Vec2, _speed: f32, _stop_distance: f32, _dt: f32) -> Vec2 {
        position
    }
}
