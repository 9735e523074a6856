//! Budget-constrained weighted-random wave composition

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::config::WaveConfiguration;
use crate::waves::curve::EliteCurve;
use crate::waves::enemy_type::{EnemyType, ThreatTier};

/// Points available for wave `wave` (1-based): round(base * growth^(wave-1))
pub fn wave_budget(base_budget: u32, growth_rate: f32, wave: u32) -> u32 {
    let exponent = wave.max(1) - 1;
    let budget = base_budget as f64 * (growth_rate as f64).powi(exponent as i32);
    // Saturating float-to-int cast
    budget.round() as u32
}

/// Linear interpolation with `t` clamped to [0, 1]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Spawn weight after difficulty progression for `wave`
pub fn adjusted_weight(enemy: &EnemyType, wave: u32, curve: &EliteCurve) -> f32 {
    let w = wave as f32;
    let scale = match enemy.tier {
        ThreatTier::Easy => lerp(3.0, 1.0, w / 20.0),
        ThreatTier::Medium => lerp(0.5, 2.0, (w / 15.0).min(1.0)),
        ThreatTier::Hard | ThreatTier::Elite => curve.evaluate(w),
    };
    (enemy.spawn_weight * scale).max(0.0)
}

/// Spawn list for one wave
#[derive(Debug, Clone)]
pub struct WaveComposition {
    pub wave: u32,
    pub budget: u32,
    /// Points spent by budgeted picks; padding is not counted
    pub spent: u32,
    /// Entries added to reach the minimum count, ignoring budget
    pub padding: usize,
    /// Shuffled spawn order
    pub enemies: Vec<Arc<EnemyType>>,
}

impl WaveComposition {
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn total_cost(&self) -> u32 {
        self.enemies.iter().map(|e| e.difficulty_cost).sum()
    }

    pub fn names(&self) -> Vec<String> {
        self.enemies.iter().map(|e| e.name.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ThreatComposer {
    base_budget: u32,
    budget_growth_rate: f32,
    min_enemies: usize,
    max_enemies: usize,
    curve: EliteCurve,
}

impl ThreatComposer {
    pub fn new(config: &WaveConfiguration) -> Self {
        Self {
            base_budget: config.base_budget,
            budget_growth_rate: config.budget_growth_rate,
            min_enemies: config.min_enemies_per_wave.min(config.max_enemies_per_wave),
            max_enemies: config.max_enemies_per_wave,
            curve: EliteCurve::from_keyframes_or_default(&config.elite_curve),
        }
    }

    pub fn budget_for(&self, wave: u32) -> u32 {
        wave_budget(self.base_budget, self.budget_growth_rate, wave)
    }

    pub fn curve(&self) -> &EliteCurve {
        &self.curve
    }

    /// Types unlocked by `wave`, paired with their adjusted weights
    pub fn eligible_pool(&self, wave: u32, roster: &[Arc<EnemyType>]) -> Vec<(Arc<EnemyType>, f32)> {
        roster
            .iter()
            .filter(|e| e.min_wave_to_appear <= wave)
            .map(|e| (Arc::clone(e), adjusted_weight(e, wave, &self.curve)))
            .collect()
    }

    /// Compose wave `wave`. Never fails: a misconfigured roster yields a
    /// padding-only (possibly empty) wave.
    pub fn compose<R: Rng + ?Sized>(&self, wave: u32, roster: &[Arc<EnemyType>], rng: &mut R) -> WaveComposition {
        let budget = self.budget_for(wave);
        let pool = self.eligible_pool(wave, roster);
        let mut remaining = budget;
        let mut enemies: Vec<Arc<EnemyType>> = Vec::new();

        while enemies.len() < self.max_enemies {
            let drawn = weighted_pick(&pool, rng)
                .map(|i| &pool[i].0)
                .filter(|e| e.difficulty_cost <= remaining)
                .cloned();
            let Some(enemy) = drawn.or_else(|| cheapest_fit(&pool, remaining)) else {
                break;
            };
            remaining -= enemy.difficulty_cost;
            enemies.push(enemy);
        }

        let mut padding = 0;
        if enemies.len() < self.min_enemies {
            let filler = padding_candidates(&pool, roster);
            if filler.is_empty() {
                tracing::warn!("wave {}: no enemy types available for padding", wave);
            }
            while enemies.len() < self.min_enemies {
                let Some(enemy) = filler.choose(rng) else {
                    break;
                };
                enemies.push(Arc::clone(enemy));
                padding += 1;
            }
        }

        enemies.shuffle(rng);

        let composition = WaveComposition {
            wave,
            budget,
            spent: budget - remaining,
            padding,
            enemies,
        };
        tracing::info!(
            "wave {} composed: {} enemies (budget {}, spent {}, padding {})",
            wave,
            composition.len(),
            budget,
            composition.spent,
            padding
        );
        composition
    }
}

/// Cumulative-weight sampling. None when no entry has positive weight.
fn weighted_pick<R: Rng + ?Sized>(pool: &[(Arc<EnemyType>, f32)], rng: &mut R) -> Option<usize> {
    let total: f32 = pool.iter().map(|(_, w)| *w).sum();
    if !(total > 0.0) || !total.is_finite() {
        return None;
    }
    let mut roll = rng.gen_range(0.0..total);
    for (i, (_, weight)) in pool.iter().enumerate() {
        if roll < *weight {
            return Some(i);
        }
        roll -= *weight;
    }
    // Float drift can leave a sliver past the last bucket
    pool.iter().rposition(|(_, w)| *w > 0.0)
}

/// Cheapest type in the pool that fits the remaining budget
fn cheapest_fit(pool: &[(Arc<EnemyType>, f32)], remaining: u32) -> Option<Arc<EnemyType>> {
    pool.iter()
        .map(|(e, _)| e)
        .filter(|e| e.difficulty_cost <= remaining)
        .min_by_key(|e| e.difficulty_cost)
        .cloned()
}

/// Easy types from the pool, else easy types from the roster, else anything
fn padding_candidates(pool: &[(Arc<EnemyType>, f32)], roster: &[Arc<EnemyType>]) -> Vec<Arc<EnemyType>> {
    let easy_in_pool: Vec<_> = pool.iter().map(|(e, _)| e).filter(|e| e.is_easy()).cloned().collect();
    if !easy_in_pool.is_empty() {
        return easy_in_pool;
    }
    let easy_in_roster: Vec<_> = roster.iter().filter(|e| e.is_easy()).cloned().collect();
    if !easy_in_roster.is_empty() {
        return easy_in_roster;
    }
    roster.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::CombatProfile;
    use crate::waves::enemy_type::default_roster;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn roster() -> Vec<Arc<EnemyType>> {
        default_roster().into_iter().map(Arc::new).collect()
    }

    fn enemy(name: &str, tier: ThreatTier, cost: u32, min_wave: u32) -> Arc<EnemyType> {
        Arc::new(EnemyType {
            name: name.into(),
            tier,
            difficulty_cost: cost,
            power_value: 1,
            spawn_weight: 1.0,
            min_wave_to_appear: min_wave,
            max_hp: 10,
            profile: CombatProfile::default(),
        })
    }

    #[test]
    fn test_budget_formula() {
        assert_eq!(wave_budget(10, 1.2, 1), 10);
        assert_eq!(wave_budget(10, 1.2, 2), 12);
        assert_eq!(wave_budget(10, 1.2, 3), 14); // 14.4
        assert_eq!(wave_budget(10, 1.2, 5), 21); // 20.736
        assert_eq!(wave_budget(10, 1.2, 0), 10);
    }

    #[test]
    fn test_lerp_clamps() {
        assert_eq!(lerp(3.0, 1.0, 0.0), 3.0);
        assert_eq!(lerp(3.0, 1.0, 0.5), 2.0);
        assert_eq!(lerp(3.0, 1.0, 2.0), 1.0);
        assert_eq!(lerp(3.0, 1.0, -1.0), 3.0);
    }

    #[test]
    fn test_weight_progression() {
        let curve = EliteCurve::default();
        let easy = enemy("e", ThreatTier::Easy, 1, 1);
        let medium = enemy("m", ThreatTier::Medium, 3, 1);
        let hard = enemy("h", ThreatTier::Hard, 6, 1);

        // Easy front-loaded
        assert!(adjusted_weight(&easy, 1, &curve) > adjusted_weight(&easy, 20, &curve));
        assert!((adjusted_weight(&easy, 20, &curve) - 1.0).abs() < 1e-6);
        // Medium peaks at 2x from wave 15
        assert!((adjusted_weight(&medium, 15, &curve) - 2.0).abs() < 1e-6);
        assert!((adjusted_weight(&medium, 25, &curve) - 2.0).abs() < 1e-6);
        // Hard follows the elite curve
        assert_eq!(adjusted_weight(&hard, 1, &curve), 0.0);
        assert!((adjusted_weight(&hard, 10, &curve) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_wave_one_respects_unlocks_and_budget() {
        let composer = ThreatComposer::new(&WaveConfiguration::default());
        let roster = roster();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let wave = composer.compose(1, &roster, &mut rng);

        assert_eq!(wave.budget, 10);
        assert!(wave.len() >= 3);
        assert!(wave.total_cost() <= 10);
        assert!(wave.enemies.iter().all(|e| e.min_wave_to_appear <= 1));
    }

    #[test]
    fn test_budget_exhausted_exactly_when_cheap_type_exists() {
        // A cost-1 type always fits, so the whole budget is spent
        let composer = ThreatComposer::new(&WaveConfiguration::default());
        let roster = roster();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let wave = composer.compose(4, &roster, &mut rng);

        assert_eq!(wave.spent, wave.budget);
        assert_eq!(wave.padding, 0);
    }

    #[test]
    fn test_max_enemies_hard_stop() {
        let config = WaveConfiguration {
            base_budget: 1000,
            max_enemies_per_wave: 7,
            ..WaveConfiguration::default()
        };
        let composer = ThreatComposer::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let wave = composer.compose(1, &roster(), &mut rng);

        assert_eq!(wave.len(), 7);
    }

    #[test]
    fn test_padding_when_budget_too_small() {
        let config = WaveConfiguration {
            base_budget: 1,
            min_enemies_per_wave: 4,
            ..WaveConfiguration::default()
        };
        let composer = ThreatComposer::new(&config);
        let roster = vec![enemy("cheap", ThreatTier::Easy, 1, 1), enemy("pricey", ThreatTier::Medium, 5, 1)];
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let wave = composer.compose(1, &roster, &mut rng);

        assert_eq!(wave.len(), 4);
        assert_eq!(wave.spent, 1);
        assert_eq!(wave.padding, 3);
        assert!(wave.enemies.iter().all(|e| e.name == "cheap"));
    }

    #[test]
    fn test_empty_pool_pads_instead_of_failing() {
        let composer = ThreatComposer::new(&WaveConfiguration::default());
        // Nothing unlocked at wave 1
        let roster = vec![enemy("late", ThreatTier::Easy, 1, 10)];
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let wave = composer.compose(1, &roster, &mut rng);

        assert_eq!(wave.len(), 3);
        assert_eq!(wave.padding, 3);
        assert_eq!(wave.spent, 0);
    }

    #[test]
    fn test_empty_roster_yields_empty_wave() {
        let composer = ThreatComposer::new(&WaveConfiguration::default());
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let wave = composer.compose(3, &[], &mut rng);

        assert!(wave.is_empty());
    }

    #[test]
    fn test_cheapest_fit_used_when_draw_too_expensive() {
        // Only the expensive type has weight; the cheap one is zero-weight hard
        let config = WaveConfiguration {
            base_budget: 6,
            min_enemies_per_wave: 0,
            ..WaveConfiguration::default()
        };
        let composer = ThreatComposer::new(&config);
        let roster = vec![enemy("big", ThreatTier::Easy, 5, 1), enemy("small", ThreatTier::Hard, 1, 1)];
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let wave = composer.compose(1, &roster, &mut rng);

        // big (5) then small (1) via the cheapest-fit scan
        assert_eq!(wave.spent, 6);
        assert_eq!(wave.len(), 2);
    }

    #[test]
    fn test_same_seed_same_wave() {
        let composer = ThreatComposer::new(&WaveConfiguration::default());
        let roster = roster();

        let a = composer.compose(8, &roster, &mut ChaCha8Rng::seed_from_u64(77));
        let b = composer.compose(8, &roster, &mut ChaCha8Rng::seed_from_u64(77));

        assert_eq!(a.names(), b.names());
    }
}
