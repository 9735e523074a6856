//! Threat composition - budgeted, weighted-random enemy waves
//!
//! Each wave gets a point budget that grows geometrically. Enemy archetypes
//! are drawn by adjusted weight (easy types front-loaded, medium peaking
//! mid-game, hard and elite following the elite curve) until the budget or
//! the per-wave cap runs out.

pub mod composition;
pub mod curve;
pub mod director;
pub mod enemy_type;
pub mod schedule;

pub use composition::{adjusted_weight, wave_budget, ThreatComposer, WaveComposition};
pub use curve::EliteCurve;
pub use director::WaveDirector;
pub use enemy_type::{default_roster, EnemyType, ThreatTier};
pub use schedule::{SpawnSchedule, SpawnTiming};
