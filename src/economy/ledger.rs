//! Resource ledger - communal power, per-villager allocations, food level
//!
//! The economy engine is the only writer. Everyone else reads.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SiegeError};
use crate::core::types::EntityId;
use crate::economy::villager::MAX_POWER;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLedger {
    total_power: u32,
    allocations: AHashMap<EntityId, u32>,
    food_percentage: f32,
}

impl ResourceLedger {
    pub fn new(total_power: u32, food_percentage: f32) -> Self {
        Self {
            total_power,
            allocations: AHashMap::new(),
            food_percentage: food_percentage.clamp(0.0, 1.0),
        }
    }

    pub fn total_power(&self) -> u32 {
        self.total_power
    }

    pub fn allocated_power(&self) -> u32 {
        self.allocations.values().sum()
    }

    pub fn unallocated_power(&self) -> u32 {
        self.total_power.saturating_sub(self.allocated_power())
    }

    /// Income and enemy drops
    pub fn add_power(&mut self, amount: u32) {
        self.total_power = self.total_power.saturating_add(amount);
    }

    /// Register a villager with an empty allocation
    pub fn open_slice(&mut self, villager: EntityId) {
        self.allocations.entry(villager).or_insert(0);
    }

    /// Remove a villager's slice; its power returns to the unallocated pool
    pub fn close_slice(&mut self, villager: EntityId) -> Option<u32> {
        self.allocations.remove(&villager)
    }

    pub fn has_slice(&self, villager: EntityId) -> bool {
        self.allocations.contains_key(&villager)
    }

    pub fn allocation(&self, villager: EntityId) -> Option<u32> {
        self.allocations.get(&villager).copied()
    }

    /// Set a villager's allocation, clamped to `MAX_POWER` and to what the
    /// pool can fund. Returns the amount actually granted.
    pub fn allocate(&mut self, villager: EntityId, requested: u32) -> Result<u32> {
        let current = self
            .allocation(villager)
            .ok_or(SiegeError::MissingLedgerSlice(villager))?;
        let available = self.unallocated_power() + current;
        let granted = requested.min(MAX_POWER).min(available);
        self.allocations.insert(villager, granted);
        Ok(granted)
    }

    pub fn food_percentage(&self) -> f32 {
        self.food_percentage
    }

    pub fn set_food_percentage(&mut self, food: f32) {
        self.food_percentage = if food.is_nan() { 0.0 } else { food.clamp(0.0, 1.0) };
    }

    pub fn slice_count(&self) -> usize {
        self.allocations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_limited_by_pool() {
        let mut ledger = ResourceLedger::new(5, 1.0);
        let a = EntityId::new();
        let b = EntityId::new();
        ledger.open_slice(a);
        ledger.open_slice(b);

        assert_eq!(ledger.allocate(a, 4).unwrap(), 4);
        // Only one unit left in the pool
        assert_eq!(ledger.allocate(b, 4).unwrap(), 1);
        assert_eq!(ledger.unallocated_power(), 0);
    }

    #[test]
    fn test_reallocation_reuses_own_share() {
        let mut ledger = ResourceLedger::new(4, 1.0);
        let a = EntityId::new();
        ledger.open_slice(a);

        ledger.allocate(a, 4).unwrap();
        assert_eq!(ledger.allocate(a, 3).unwrap(), 3);
        assert_eq!(ledger.unallocated_power(), 1);
    }

    #[test]
    fn test_allocation_capped_at_max_power() {
        let mut ledger = ResourceLedger::new(100, 1.0);
        let a = EntityId::new();
        ledger.open_slice(a);

        assert_eq!(ledger.allocate(a, 9).unwrap(), MAX_POWER);
    }

    #[test]
    fn test_missing_slice_is_error() {
        let mut ledger = ResourceLedger::new(10, 1.0);
        let result = ledger.allocate(EntityId::new(), 2);
        assert!(matches!(result, Err(SiegeError::MissingLedgerSlice(_))));
    }

    #[test]
    fn test_close_slice_returns_power() {
        let mut ledger = ResourceLedger::new(6, 1.0);
        let a = EntityId::new();
        ledger.open_slice(a);
        ledger.allocate(a, 4).unwrap();

        assert_eq!(ledger.close_slice(a), Some(4));
        assert_eq!(ledger.unallocated_power(), 6);
    }

    #[test]
    fn test_food_percentage_clamped() {
        let mut ledger = ResourceLedger::new(0, 1.0);
        ledger.set_food_percentage(1.7);
        assert_eq!(ledger.food_percentage(), 1.0);
        ledger.set_food_percentage(-0.2);
        assert_eq!(ledger.food_percentage(), 0.0);
    }
}
