//! Rebellion completion, cascades and mass rebellion
//!
//! Cascade rules:
//! - Captain rebels: every Loyal Commoner at or above
//!   `captain_cascade_threshold` starts its own rebellion.
//! - Anyone rebels: every other Loyal villager at or above
//!   `cascade_threshold` takes `cascade_witness_penalty` discontent.
//! - Mass rebellion: Angry + Rebel count >= `mass_rebellion_min_count` and
//!   share >= `mass_rebellion_min_percent`. Loyal villagers at or above
//!   `mass_rebellion_threshold` then defect outright.

use crate::core::types::EntityId;
use crate::economy::engine::EconomyEngine;
use crate::economy::loyalty::LoyaltyState;
use crate::economy::villager::{Role, Villager};

/// Secondary rebellions caused by one villager turning Rebel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeOutcome {
    /// Commoners sent into rebellion by a rebelling Captain
    pub captain_followers: Vec<EntityId>,
    /// Villagers pushed over the threshold by the witness penalty
    pub witnesses_angered: Vec<EntityId>,
}

impl CascadeOutcome {
    pub fn is_empty(&self) -> bool {
        self.captain_followers.is_empty() && self.witnesses_angered.is_empty()
    }

    /// Every villager that entered Angry because of this cascade
    pub fn newly_angry(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.captain_followers
            .iter()
            .chain(self.witnesses_angered.iter())
            .copied()
    }
}

/// Share of the living population that is Rebel
pub fn rebel_fraction(population: &[Villager]) -> f32 {
    let living = population.iter().filter(|v| v.is_alive()).count();
    if living == 0 {
        return 0.0;
    }
    let rebels = population.iter().filter(|v| v.is_alive() && v.is_rebel()).count();
    rebels as f32 / living as f32
}

/// Living villagers that are Angry or Rebel
pub fn rebelling_count(population: &[Villager]) -> usize {
    population
        .iter()
        .filter(|v| v.is_alive() && v.loyalty.is_rebelling())
        .count()
}

impl EconomyEngine {
    /// Angry -> Rebel at the end of the telegraph window. Flips allegiance
    /// and applies the rebel damage and cooldown multipliers.
    pub fn complete_rebellion(&self, villager: &mut Villager) -> bool {
        if villager.loyalty != LoyaltyState::Angry {
            return false;
        }
        villager.loyalty = LoyaltyState::Rebel;
        villager.recompute_combat(self.tuning());
        // Old target was chosen under the old allegiance
        villager.combatant.target = None;
        tracing::info!("{} ({:?}) has rebelled", villager.name, villager.role);
        true
    }

    /// Apply cascade rules after `rebel_id` turned Rebel
    pub fn evaluate_cascade(&self, rebel_id: EntityId, population: &mut [Villager]) -> CascadeOutcome {
        let mut outcome = CascadeOutcome::default();
        let Some(rebel_role) = population.iter().find(|v| v.id == rebel_id).map(|v| v.role) else {
            tracing::warn!("cascade requested for unknown villager {:?}", rebel_id);
            return outcome;
        };

        let mut order: Vec<usize> = (0..population.len()).collect();
        order.sort_by_key(|&i| population[i].role.priority());

        let constants = self.constants();

        if rebel_role == Role::Captain {
            for &i in &order {
                let villager = &mut population[i];
                if villager.role == Role::Commoner
                    && villager.is_alive()
                    && villager.stats.discontent >= constants.captain_cascade_threshold
                    && self.begin_rebellion(villager)
                {
                    outcome.captain_followers.push(villager.id);
                }
            }
        }

        for &i in &order {
            let villager = &mut population[i];
            if villager.id == rebel_id
                || !villager.is_loyal()
                || !villager.is_alive()
                || villager.stats.discontent < constants.cascade_threshold
            {
                continue;
            }
            let change = self.add_discontent(villager, constants.cascade_witness_penalty);
            if change.rebellion_started {
                outcome.witnesses_angered.push(villager.id);
            }
        }

        if !outcome.is_empty() {
            tracing::info!(
                "rebellion cascade: {} captain followers, {} witnesses",
                outcome.captain_followers.len(),
                outcome.witnesses_angered.len()
            );
        }
        outcome
    }

    pub fn mass_rebellion_triggered(&self, population: &[Villager]) -> bool {
        let living = population.iter().filter(|v| v.is_alive()).count();
        if living == 0 {
            return false;
        }
        let rebelling = rebelling_count(population);
        let share = rebelling as f32 / living as f32;
        rebelling >= self.constants().mass_rebellion_min_count
            && share >= self.constants().mass_rebellion_min_percent
    }

    /// Loyal villagers past `mass_rebellion_threshold` defect immediately
    pub fn apply_mass_rebellion(&self, population: &mut [Villager]) -> Vec<EntityId> {
        let threshold = self.constants().mass_rebellion_threshold;
        let mut defected = Vec::new();
        for villager in population.iter_mut() {
            if villager.is_alive() && villager.is_loyal() && villager.stats.discontent >= threshold {
                self.begin_rebellion(villager);
                self.complete_rebellion(villager);
                defected.push(villager.id);
            }
        }
        defected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CombatTuning, DiscontentConstants};
    use crate::core::types::Vec2;

    fn engine() -> EconomyEngine {
        EconomyEngine::new(DiscontentConstants::default(), CombatTuning::default())
    }

    fn villager(name: &str, role: Role) -> Villager {
        Villager::new(name, role, Vec2::ZERO, &CombatTuning::default())
    }

    #[test]
    fn test_complete_requires_angry() {
        let engine = engine();
        let mut v = villager("Loyal", Role::Farmer);

        assert!(!engine.complete_rebellion(&mut v));
        assert!(v.is_loyal());

        engine.begin_rebellion(&mut v);
        assert!(engine.complete_rebellion(&mut v));
        assert!(v.is_rebel());

        // Rebel is terminal
        assert!(!engine.complete_rebellion(&mut v));
        assert!(!engine.begin_rebellion(&mut v));
    }

    #[test]
    fn test_captain_cascade_threshold() {
        let engine = engine();
        let mut population = vec![
            villager("Captain", Role::Captain),
            villager("High", Role::Commoner),
            villager("Low", Role::Commoner),
        ];
        engine.add_discontent(&mut population[1], 60.0);
        engine.add_discontent(&mut population[2], 40.0);
        engine.begin_rebellion(&mut population[0]);
        engine.complete_rebellion(&mut population[0]);
        let captain = population[0].id;

        let outcome = engine.evaluate_cascade(captain, &mut population);

        assert_eq!(outcome.captain_followers, vec![population[1].id]);
        assert_eq!(population[1].loyalty(), LoyaltyState::Angry);
        assert_eq!(population[2].loyalty(), LoyaltyState::Loyal);
    }

    #[test]
    fn test_captain_cascade_ignores_other_roles() {
        let engine = engine();
        let mut population = vec![villager("Captain", Role::Captain), villager("Farmer", Role::Farmer)];
        engine.add_discontent(&mut population[1], 60.0);
        let captain = population[0].id;

        let outcome = engine.evaluate_cascade(captain, &mut population);

        assert!(outcome.captain_followers.is_empty());
        assert!(population[1].is_loyal());
    }

    #[test]
    fn test_non_captain_does_not_pull_commoners() {
        let engine = engine();
        let mut population = vec![villager("Mage", Role::Mage), villager("Commoner", Role::Commoner)];
        engine.add_discontent(&mut population[1], 60.0);
        let mage = population[0].id;

        let outcome = engine.evaluate_cascade(mage, &mut population);

        assert!(outcome.is_empty());
        assert!(population[1].is_loyal());
    }

    #[test]
    fn test_witness_penalty_can_tip_over() {
        let engine = engine();
        let mut population = vec![
            villager("Rebel", Role::Builder),
            villager("Brink", Role::Farmer),
            villager("Calm", Role::Farmer),
        ];
        engine.add_discontent(&mut population[1], 95.0);
        engine.add_discontent(&mut population[2], 30.0);
        let rebel = population[0].id;

        let outcome = engine.evaluate_cascade(rebel, &mut population);

        assert_eq!(outcome.witnesses_angered, vec![population[1].id]);
        assert_eq!(population[1].stats().discontent(), 100.0);
        // Below cascade_threshold: untouched
        assert_eq!(population[2].stats().discontent(), 30.0);
    }

    #[test]
    fn test_witness_penalty_below_tipping_point() {
        let engine = engine();
        let mut population = vec![villager("Rebel", Role::Builder), villager("Uneasy", Role::Farmer)];
        engine.add_discontent(&mut population[1], 75.0);
        let rebel = population[0].id;

        let outcome = engine.evaluate_cascade(rebel, &mut population);

        assert!(outcome.witnesses_angered.is_empty());
        assert_eq!(population[1].stats().discontent(), 85.0);
        assert!(population[1].is_loyal());
    }

    #[test]
    fn test_mass_rebellion_needs_count_and_share() {
        let engine = engine();
        // 3 of 12 = 25% < 30%
        let mut population: Vec<Villager> = (0..12).map(|i| villager(&format!("v{i}"), Role::Commoner)).collect();
        for v in population.iter_mut().take(3) {
            engine.begin_rebellion(v);
        }
        assert!(!engine.mass_rebellion_triggered(&population));

        // 4 of 12 = 33%
        engine.begin_rebellion(&mut population[3]);
        assert!(engine.mass_rebellion_triggered(&population));
    }

    #[test]
    fn test_mass_rebellion_min_count() {
        let engine = engine();
        // 2 of 2 = 100% share but below min count 3
        let mut population = vec![villager("a", Role::Commoner), villager("b", Role::Commoner)];
        for v in population.iter_mut() {
            engine.begin_rebellion(v);
        }
        assert!(!engine.mass_rebellion_triggered(&population));
    }

    #[test]
    fn test_apply_mass_rebellion_defects_high_discontent() {
        let engine = engine();
        let mut population = vec![villager("hot", Role::Farmer), villager("cool", Role::Farmer)];
        engine.add_discontent(&mut population[0], 85.0);
        engine.add_discontent(&mut population[1], 20.0);

        let defected = engine.apply_mass_rebellion(&mut population);

        assert_eq!(defected, vec![population[0].id]);
        assert!(population[0].is_rebel());
        assert!(population[1].is_loyal());
    }

    #[test]
    fn test_rebel_fraction() {
        let engine = engine();
        let mut population = vec![
            villager("a", Role::Farmer),
            villager("b", Role::Farmer),
            villager("c", Role::Farmer),
            villager("d", Role::Farmer),
        ];
        engine.begin_rebellion(&mut population[0]);
        engine.complete_rebellion(&mut population[0]);
        engine.begin_rebellion(&mut population[1]);

        assert_eq!(rebel_fraction(&population), 0.25);
        assert_eq!(rebelling_count(&population), 2);
        assert_eq!(rebel_fraction(&[]), 0.0);
    }
}
