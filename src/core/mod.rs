pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::SimClock;
pub use config::{CombatTuning, DiscontentConstants, Settings, SiegeConfig, StartingPhase, WaveConfiguration};
pub use error::{Result, SiegeError};
pub use types::{EntityId, Tick, Vec2};
