//! Citadel Siege - day/night settlement siege simulation core
//!
//! A settlement allocates power and food by day and fights procedurally
//! composed enemy waves by night. Poorly provisioned villagers grow
//! discontent, turn Angry, then Rebel and fight the settlement.

pub mod combat;
pub mod core;
pub mod economy;
pub mod phase;
pub mod simulation;
pub mod waves;

pub use crate::core::config::SiegeConfig;
pub use crate::core::error::{Result, SiegeError};
pub use crate::simulation::Siege;
