//! Economy engine - allocation, daily settlement and discontent
//!
//! Discontent accrues from shortfalls and incidents and only recovers for
//! villagers who are fully provisioned. Crossing the rebellion threshold
//! while Loyal starts the rebellion sequence (see `rebellion.rs`).

use crate::core::config::{CombatTuning, DiscontentConstants};
use crate::core::error::{Result, SiegeError};
use crate::core::types::EntityId;
use crate::economy::ledger::ResourceLedger;
use crate::economy::loyalty::LoyaltyState;
use crate::economy::villager::{tier_cost, tier_for_power, Villager, MAX_POWER};

/// Discontent never leaves this range
pub const MAX_DISCONTENT: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationResult {
    pub granted: u32,
    pub tier_before: u8,
    pub tier_after: u8,
    /// Max HP rose and the villager was healed to the new max
    pub healed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscontentChange {
    pub before: f32,
    pub after: f32,
    /// Loyal villager crossed the threshold and is now Angry
    pub rebellion_started: bool,
}

/// Result of a settlement pass over the whole population
#[derive(Debug, Clone, Default)]
pub struct SettlementReport {
    pub changes: Vec<(EntityId, DiscontentChange)>,
    /// Villagers excluded because of a missing dependency
    pub skipped: Vec<EntityId>,
}

impl SettlementReport {
    pub fn rebellions_started(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.changes
            .iter()
            .filter(|(_, c)| c.rebellion_started)
            .map(|(id, _)| *id)
    }
}

#[derive(Debug, Clone)]
pub struct EconomyEngine {
    constants: DiscontentConstants,
    tuning: CombatTuning,
}

impl EconomyEngine {
    pub fn new(constants: DiscontentConstants, tuning: CombatTuning) -> Self {
        Self { constants, tuning }
    }

    pub fn constants(&self) -> &DiscontentConstants {
        &self.constants
    }

    pub fn tuning(&self) -> &CombatTuning {
        &self.tuning
    }

    /// Allocate power to a villager, clamped to [0, MAX_POWER] and to the
    /// unallocated pool. Recomputes tier, HP and combat stats.
    pub fn allocate_power(
        &self,
        ledger: &mut ResourceLedger,
        villager: &mut Villager,
        amount: i32,
    ) -> Result<AllocationResult> {
        let requested = amount.clamp(0, MAX_POWER as i32) as u32;
        let granted = ledger.allocate(villager.id, requested)?;
        Ok(self.apply_power(villager, granted))
    }

    pub(crate) fn apply_power(&self, villager: &mut Villager, power: u32) -> AllocationResult {
        let power = power.min(MAX_POWER);
        let tier_before = villager.stats.tier;
        let tier_after = tier_for_power(power);
        let old_max = villager.stats.max_hp;
        let new_max = villager.max_hp_for_tier(tier_after, &self.tuning);

        villager.stats.power = power;
        villager.stats.tier = tier_after;
        villager.stats.max_hp = new_max;

        // Heal only when the ceiling rises; never resurrect
        let healed = new_max > old_max && villager.is_alive();
        if healed {
            villager.stats.current_hp = new_max;
        } else {
            villager.stats.current_hp = villager.stats.current_hp.min(new_max);
        }

        villager.recompute_combat(&self.tuning);

        if tier_before != tier_after {
            tracing::debug!(
                "{} ({:?}) tier {} -> {} at power {}",
                villager.name,
                villager.role,
                tier_before,
                tier_after,
                power
            );
        }

        AllocationResult {
            granted: power,
            tier_before,
            tier_after,
            healed,
        }
    }

    pub fn set_food(&self, villager: &mut Villager, food: f32) {
        villager.stats.food = if food.is_nan() { 0.0 } else { food.clamp(0.0, 1.0) };
    }

    /// End-of-day settlement for one villager: finalize power from the
    /// ledger, then charge discontent for power and food shortfalls.
    pub fn settle_day(&self, ledger: &ResourceLedger, villager: &mut Villager) -> Result<DiscontentChange> {
        let allocated = ledger
            .allocation(villager.id)
            .ok_or(SiegeError::MissingLedgerSlice(villager.id))?;
        if allocated != villager.stats.power {
            self.apply_power(villager, allocated);
        }

        let stats = &villager.stats;
        let power_shortage = tier_cost(stats.tier).saturating_sub(stats.power) as f32;
        let food_shortage = (1.0 - stats.food).max(0.0);
        let delta = power_shortage * self.constants.power_penalty + food_shortage * self.constants.food_penalty;

        Ok(self.add_discontent(villager, delta))
    }

    /// Settle every villager. Failures are logged and skipped.
    pub fn settle_all(&self, ledger: &ResourceLedger, population: &mut [Villager]) -> SettlementReport {
        let mut report = SettlementReport::default();
        for villager in population.iter_mut().filter(|v| v.is_alive()) {
            match self.settle_day(ledger, villager) {
                Ok(change) => report.changes.push((villager.id, change)),
                Err(e) => {
                    tracing::warn!("settlement skipped for {}: {}", villager.name, e);
                    report.skipped.push(villager.id);
                }
            }
        }
        report
    }

    /// Add (or remove) discontent, clamped to [0, 100]. Starts the
    /// rebellion sequence on an upward crossing of the threshold while Loyal.
    pub fn add_discontent(&self, villager: &mut Villager, amount: f32) -> DiscontentChange {
        let before = villager.stats.discontent;
        let raw = before + if amount.is_nan() { 0.0 } else { amount };
        let after = raw.clamp(0.0, MAX_DISCONTENT);
        villager.stats.discontent = after;

        let threshold = self.constants.rebellion_threshold;
        let crossed = before < threshold && after >= threshold;
        let rebellion_started = crossed && self.begin_rebellion(villager);

        DiscontentChange {
            before,
            after,
            rebellion_started,
        }
    }

    /// Well-provisioned villagers shed `recovery_rate` discontent
    pub fn nightly_recovery(&self, villager: &mut Villager) -> bool {
        if !villager.stats.well_provisioned() {
            return false;
        }
        villager.stats.discontent = (villager.stats.discontent - self.constants.recovery_rate).max(0.0);
        true
    }

    pub fn recover_all(&self, population: &mut [Villager]) -> usize {
        let mut recovered = 0;
        for villager in population.iter_mut().filter(|v| v.is_alive()) {
            if self.nightly_recovery(villager) {
                recovered += 1;
            }
        }
        recovered
    }

    /// Loyal -> Angry. Returns false if the villager is already past Loyal.
    pub fn begin_rebellion(&self, villager: &mut Villager) -> bool {
        if villager.loyalty != LoyaltyState::Loyal {
            return false;
        }
        villager.loyalty = LoyaltyState::Angry;
        tracing::info!(
            "{} ({:?}) is angry (discontent {:.0})",
            villager.name,
            villager.role,
            villager.stats.discontent
        );
        true
    }
}
