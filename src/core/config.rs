//! Simulation configuration with documented constants
//!
//! `Settings`, `WaveConfiguration`, `DiscontentConstants` and `CombatTuning`
//! are the whole configuration surface. Every struct carries its defaults,
//! and TOML files only need to name the fields they override.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::Vec2;
use crate::waves::curve::{EliteCurve, DEFAULT_ELITE_KEYFRAMES};
use crate::waves::enemy_type::{default_roster, EnemyType};

/// Phase the orchestrator starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StartingPhase {
    #[default]
    Day,
    Night,
}

/// Process-wide settings for a playthrough
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub starting_phase: StartingPhase,
    /// Entering Night with a wave index above this wins the game
    pub max_waves: u32,
    pub ticks_per_second: u32,
    pub day_duration_secs: f32,
    /// Length of the dusk/dawn animation window
    pub transition_duration_secs: f32,
    /// Communal power added on every Day start
    pub daily_power_income: u32,
    pub starting_power: u32,
    pub starting_food: f32,
    /// Rebel share of the population that loses the game (strictly above)
    pub rebel_loss_fraction: f32,
    pub arena_radius: f32,
    pub player_max_hp: i32,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_phase: StartingPhase::Day,
            max_waves: 20,
            ticks_per_second: 30,
            day_duration_secs: 45.0,
            transition_duration_secs: 3.0,
            daily_power_income: 6,
            starting_power: 10,
            starting_food: 1.0,
            rebel_loss_fraction: 0.5,
            arena_radius: 40.0,
            player_max_hp: 200,
            seed: 0x5EED,
        }
    }
}

impl Settings {
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.ticks_per_second.max(1) as f32
    }
}

/// Wave tuning, read-only while a wave is running
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfiguration {
    pub base_budget: u32,
    /// Budget multiplier per wave: budget = base * rate^(wave - 1)
    pub budget_growth_rate: f32,
    pub min_enemies_per_wave: usize,
    pub max_enemies_per_wave: usize,
    /// (wave, probability) keyframes for hard and elite spawn weights
    pub elite_curve: Vec<(f32, f32)>,
    pub time_between_spawns: f32,
    /// Inter-spawn delay is multiplied by U(lo, hi)
    pub spawn_jitter: (f32, f32),
    /// Applied to `time_between_spawns` after every completed wave
    pub wave_timing_reduction: f32,
    pub min_time_between_spawns: f32,
    pub spawn_points: Vec<Vec2>,
}

impl Default for WaveConfiguration {
    fn default() -> Self {
        let r = Settings::default().arena_radius;
        Self {
            base_budget: 10,
            budget_growth_rate: 1.2,
            min_enemies_per_wave: 3,
            max_enemies_per_wave: 40,
            elite_curve: DEFAULT_ELITE_KEYFRAMES.to_vec(),
            time_between_spawns: 1.5,
            spawn_jitter: (0.7, 1.3),
            wave_timing_reduction: 0.95,
            min_time_between_spawns: 0.3,
            spawn_points: vec![
                Vec2::new(r, 0.0),
                Vec2::new(0.0, r),
                Vec2::new(-r, 0.0),
                Vec2::new(0.0, -r),
            ],
        }
    }
}

/// Discontent weights and rebellion thresholds shared by every villager
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscontentConstants {
    /// Per missing unit of power below the tier cost
    pub power_penalty: f32,
    /// Per full unit of unmet food need
    pub food_penalty: f32,
    pub friendly_fire_penalty: f32,
    pub structure_destroyed_penalty: f32,
    pub recovery_rate: f32,
    /// Crossing this while Loyal starts the rebellion sequence
    pub rebellion_threshold: f32,
    /// Loyal villagers at or above this take `cascade_witness_penalty` when anyone rebels
    pub cascade_threshold: f32,
    pub cascade_witness_penalty: f32,
    /// Loyal villagers at or above this join a mass rebellion outright
    pub mass_rebellion_threshold: f32,
    /// Commoners at or above this follow a rebelling Captain
    pub captain_cascade_threshold: f32,
    pub mass_rebellion_min_count: usize,
    pub mass_rebellion_min_percent: f32,
    /// Length of the Angry telegraph before a villager turns Rebel
    pub angry_telegraph_secs: f32,
}

impl Default for DiscontentConstants {
    fn default() -> Self {
        Self {
            power_penalty: 5.0,
            food_penalty: 10.0,
            friendly_fire_penalty: 10.0,
            structure_destroyed_penalty: 15.0,
            recovery_rate: 10.0,
            rebellion_threshold: 100.0,
            cascade_threshold: 70.0,
            cascade_witness_penalty: 10.0,
            mass_rebellion_threshold: 80.0,
            captain_cascade_threshold: 50.0,
            mass_rebellion_min_count: 3,
            mass_rebellion_min_percent: 0.3,
            angry_telegraph_secs: 3.0,
        }
    }
}

/// Combat scaling shared by villagers and enemies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub perception_interval_ticks: u32,
    /// Angry villagers re-scan less often
    pub angry_perception_interval_ticks: u32,
    /// Multiplier on detection radius and damage for Angry villagers
    pub angry_combat_efficiency: f32,
    pub rebel_damage_multiplier: f32,
    pub rebel_cooldown_multiplier: f32,
    /// Max HP bonus per tier (0.2 = +20%)
    pub hp_per_tier: f32,
    pub damage_per_tier: f32,
    pub villager_detection_radius: f32,
    pub enemy_detection_radius: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            perception_interval_ticks: 10,
            angry_perception_interval_ticks: 20,
            angry_combat_efficiency: 0.7,
            rebel_damage_multiplier: 1.5,
            rebel_cooldown_multiplier: 0.8,
            hp_per_tier: 0.2,
            damage_per_tier: 0.25,
            villager_detection_radius: 15.0,
            enemy_detection_radius: 20.0,
        }
    }
}

/// Complete configuration for one simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiegeConfig {
    pub settings: Settings,
    pub waves: WaveConfiguration,
    pub discontent: DiscontentConstants,
    pub combat: CombatTuning,
    pub enemies: Vec<EnemyType>,
}

impl Default for SiegeConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            waves: WaveConfiguration::default(),
            discontent: DiscontentConstants::default(),
            combat: CombatTuning::default(),
            enemies: default_roster(),
        }
    }
}

impl SiegeConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Replace unusable values with safe defaults.
    ///
    /// Returns one message per repaired field; each is also logged.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        let s = Settings::default();
        let w = WaveConfiguration::default();
        let d = DiscontentConstants::default();
        let c = CombatTuning::default();

        if self.settings.max_waves == 0 {
            warnings.push("max_waves is 0; using default".to_string());
            self.settings.max_waves = s.max_waves;
        }
        if self.settings.ticks_per_second == 0 {
            warnings.push("ticks_per_second is 0; using default".to_string());
            self.settings.ticks_per_second = s.ticks_per_second;
        }
        if !positive(self.settings.day_duration_secs) {
            warnings.push(format!(
                "day_duration_secs ({}) must be positive; using default",
                self.settings.day_duration_secs
            ));
            self.settings.day_duration_secs = s.day_duration_secs;
        }
        if !non_negative(self.settings.transition_duration_secs) {
            warnings.push("transition_duration_secs must not be negative; using default".into());
            self.settings.transition_duration_secs = s.transition_duration_secs;
        }
        if !(0.0..=1.0).contains(&self.settings.starting_food) {
            warnings.push("starting_food outside [0, 1]; clamped".into());
            self.settings.starting_food = clamp_unit(self.settings.starting_food);
        }
        if !(0.0..=1.0).contains(&self.settings.rebel_loss_fraction) {
            warnings.push("rebel_loss_fraction outside [0, 1]; using default".into());
            self.settings.rebel_loss_fraction = s.rebel_loss_fraction;
        }

        if !positive(self.settings.arena_radius) {
            warnings.push("arena_radius must be positive; using default".into());
            self.settings.arena_radius = s.arena_radius;
        }

        if EliteCurve::from_keyframes(&self.waves.elite_curve).is_none() {
            warnings.push("elite curve keyframes missing or invalid; using default curve".into());
            self.waves.elite_curve = w.elite_curve.clone();
        }
        if !positive(self.waves.budget_growth_rate) {
            warnings.push("budget_growth_rate must be positive; using default".into());
            self.waves.budget_growth_rate = w.budget_growth_rate;
        }
        if self.waves.min_enemies_per_wave > self.waves.max_enemies_per_wave {
            warnings.push(format!(
                "min_enemies_per_wave ({}) exceeds max_enemies_per_wave ({}); clamped",
                self.waves.min_enemies_per_wave, self.waves.max_enemies_per_wave
            ));
            self.waves.min_enemies_per_wave = self.waves.max_enemies_per_wave;
        }
        if !positive(self.waves.time_between_spawns) {
            warnings.push("time_between_spawns must be positive; using default".into());
            self.waves.time_between_spawns = w.time_between_spawns;
        }
        if !positive(self.waves.min_time_between_spawns) {
            warnings.push("min_time_between_spawns must be positive; using default".into());
            self.waves.min_time_between_spawns = w.min_time_between_spawns;
        }
        if !(self.waves.wave_timing_reduction > 0.0 && self.waves.wave_timing_reduction <= 1.0) {
            warnings.push("wave_timing_reduction outside (0, 1]; using default".into());
            self.waves.wave_timing_reduction = w.wave_timing_reduction;
        }
        let (lo, hi) = self.waves.spawn_jitter;
        if !(positive(lo) && hi.is_finite() && lo <= hi) {
            warnings.push(format!("spawn_jitter ({lo}, {hi}) is not a valid range; using default"));
            self.waves.spawn_jitter = w.spawn_jitter;
        }
        if self.waves.spawn_points.is_empty() {
            warnings.push("no spawn points configured; synthesizing one at the arena edge".into());
            self.waves.spawn_points = vec![Vec2::new(self.settings.arena_radius, 0.0)];
        }

        if !(0.0..=1.0).contains(&self.discontent.mass_rebellion_min_percent) {
            warnings.push("mass_rebellion_min_percent outside [0, 1]; clamped".into());
            self.discontent.mass_rebellion_min_percent =
                clamp_unit(self.discontent.mass_rebellion_min_percent);
        }
        if !(self.discontent.rebellion_threshold > 0.0 && self.discontent.rebellion_threshold <= 100.0) {
            warnings.push("rebellion_threshold outside (0, 100]; using default".into());
            self.discontent.rebellion_threshold = d.rebellion_threshold;
        }
        if !non_negative(self.discontent.angry_telegraph_secs) {
            warnings.push("angry_telegraph_secs must not be negative; using default".into());
            self.discontent.angry_telegraph_secs = d.angry_telegraph_secs;
        }

        if self.combat.perception_interval_ticks == 0 {
            warnings.push("perception_interval_ticks is 0; using default".into());
            self.combat.perception_interval_ticks = c.perception_interval_ticks;
        }
        if self.combat.angry_perception_interval_ticks == 0 {
            warnings.push("angry_perception_interval_ticks is 0; using default".into());
            self.combat.angry_perception_interval_ticks = c.angry_perception_interval_ticks;
        }
        if !(self.combat.angry_combat_efficiency > 0.0 && self.combat.angry_combat_efficiency <= 1.0) {
            warnings.push("angry_combat_efficiency outside (0, 1]; using default".into());
            self.combat.angry_combat_efficiency = c.angry_combat_efficiency;
        }

        let discontent_tunables = [
            ("power_penalty", &mut self.discontent.power_penalty, d.power_penalty),
            ("food_penalty", &mut self.discontent.food_penalty, d.food_penalty),
            ("friendly_fire_penalty", &mut self.discontent.friendly_fire_penalty, d.friendly_fire_penalty),
            (
                "structure_destroyed_penalty",
                &mut self.discontent.structure_destroyed_penalty,
                d.structure_destroyed_penalty,
            ),
            ("recovery_rate", &mut self.discontent.recovery_rate, d.recovery_rate),
            ("cascade_threshold", &mut self.discontent.cascade_threshold, d.cascade_threshold),
            ("cascade_witness_penalty", &mut self.discontent.cascade_witness_penalty, d.cascade_witness_penalty),
            ("mass_rebellion_threshold", &mut self.discontent.mass_rebellion_threshold, d.mass_rebellion_threshold),
            (
                "captain_cascade_threshold",
                &mut self.discontent.captain_cascade_threshold,
                d.captain_cascade_threshold,
            ),
        ];
        let combat_tunables = [
            ("rebel_damage_multiplier", &mut self.combat.rebel_damage_multiplier, c.rebel_damage_multiplier),
            ("rebel_cooldown_multiplier", &mut self.combat.rebel_cooldown_multiplier, c.rebel_cooldown_multiplier),
            ("hp_per_tier", &mut self.combat.hp_per_tier, c.hp_per_tier),
            ("damage_per_tier", &mut self.combat.damage_per_tier, c.damage_per_tier),
            ("villager_detection_radius", &mut self.combat.villager_detection_radius, c.villager_detection_radius),
            ("enemy_detection_radius", &mut self.combat.enemy_detection_radius, c.enemy_detection_radius),
        ];
        for (name, value, default) in discontent_tunables.into_iter().chain(combat_tunables) {
            if !non_negative(*value) {
                warnings.push(format!("{name} ({value}) must be finite and non-negative; using default"));
                *value = default;
            }
        }

        if self.enemies.is_empty() {
            // Recoverable: composition degrades to an empty wave instead of stalling
            warnings.push("enemy roster is empty; waves will contain no enemies".into());
        }

        for warning in &warnings {
            tracing::warn!("config: {}", warning);
        }
        warnings
    }

    /// Validate configuration for internal consistency without repairing it
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut probe = self.clone();
        let problems = probe.sanitize();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
