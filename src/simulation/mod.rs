//! Simulation root and per-tick pipeline

pub mod actors;
pub mod locomotion;
pub mod siege;
pub mod snapshot;
pub mod tick;
pub mod transitions;

pub use actors::{Enemy, Player};
pub use locomotion::{Locomotion, Stationary, StraightLine};
pub use siege::Siege;
pub use snapshot::{PopulationSummary, SiegeSnapshot, VillagerSnapshot};
