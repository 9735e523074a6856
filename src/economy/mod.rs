//! Political economy - power allocation, discontent and rebellion
//!
//! Villagers are paid in communal power and food. Shortfalls accumulate as
//! discontent; crossing the rebellion threshold sends a villager down the
//! one-way Loyal -> Angry -> Rebel path, which can cascade to others.

pub mod engine;
pub mod ledger;
pub mod loyalty;
pub mod rebellion;
pub mod villager;

pub use engine::{AllocationResult, DiscontentChange, EconomyEngine, SettlementReport};
pub use ledger::ResourceLedger;
pub use loyalty::LoyaltyState;
pub use rebellion::{rebel_fraction, rebelling_count, CascadeOutcome};
pub use villager::{tier_cost, tier_for_power, Role, Villager, VillagerStats, MAX_POWER};
