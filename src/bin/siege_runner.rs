//! Headless Siege Runner
//!
//! Plays a full siege with an automatic allocation policy and prints the
//! final report as JSON or text.

use std::path::PathBuf;
use std::process;

use citadel_siege::core::types::Vec2;
use citadel_siege::economy::Role;
use citadel_siege::phase::{GamePhase, SiegeEvent};
use citadel_siege::{Siege, SiegeConfig};
use clap::Parser;
use serde::Serialize;

/// Headless Siege Runner - automated playthroughs for balancing
#[derive(Parser, Debug)]
#[command(name = "siege_runner")]
#[command(about = "Run a full day/night siege and report the outcome")]
struct Args {
    /// Random seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many simulated seconds
    #[arg(long, default_value_t = 3600.0)]
    max_seconds: f64,

    /// Food level handed out every day (0.0 - 1.0)
    #[arg(long, default_value_t = 1.0)]
    food: f32,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Log every phase change and rebellion to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RunReport {
    seed: u64,
    outcome: String,
    waves_survived: u32,
    seconds: f64,
    rebellions: usize,
    friendly_fire_incidents: usize,
    enemies_spawned: usize,
    snapshot: citadel_siege::simulation::SiegeSnapshot,
}

/// Starting population, placed in a ring around the player
const POPULATION: [(&str, Role); 10] = [
    ("Aldric", Role::Captain),
    ("Mirela", Role::Mage),
    ("Tomas", Role::Builder),
    ("Greta", Role::Builder),
    ("Hob", Role::Farmer),
    ("Wenna", Role::Farmer),
    ("Pim", Role::Commoner),
    ("Orla", Role::Commoner),
    ("Fenn", Role::Commoner),
    ("Ysolde", Role::Commoner),
];

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "citadel_siege=debug" } else { "citadel_siege=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => match SiegeConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => SiegeConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.settings.seed = seed;
    }
    let seed = config.settings.seed;
    let dt = config.settings.tick_seconds();

    let mut siege = Siege::new(config);
    for (i, (name, role)) in POPULATION.iter().enumerate() {
        let angle = i as f32 / POPULATION.len() as f32 * std::f32::consts::TAU;
        siege.add_villager(*name, *role, Vec2::from_angle(angle) * 5.0);
    }
    siege.set_food_percentage(args.food);

    let mut rebellions = 0;
    let mut friendly_fire = 0;
    let mut spawned = 0;

    if let Err(e) = siege.start() {
        eprintln!("Failed to start siege: {}", e);
        process::exit(1);
    }
    if siege.phase() == GamePhase::Day {
        allocate_evenly(&mut siege, args.food);
    }

    while !siege.is_over() && siege.now() < args.max_seconds {
        let log = siege.tick(dt);
        for event in log.iter() {
            match event {
                SiegeEvent::PhaseChanged { next: GamePhase::Day, .. } => allocate_evenly(&mut siege, args.food),
                SiegeEvent::VillagerRebelled { .. } => rebellions += 1,
                SiegeEvent::FriendlyFire { .. } => friendly_fire += 1,
                SiegeEvent::EnemySpawned { .. } => spawned += 1,
                _ => {}
            }
            if args.verbose {
                if let SiegeEvent::PhaseChanged { previous, next } = event {
                    eprintln!("[{:>7.1}s] {:?} -> {:?}", siege.now(), previous, next);
                }
            }
        }
    }

    let snapshot = siege.snapshot();
    let outcome = match snapshot.outcome {
        Some(outcome) => format!("{:?}", outcome),
        None => "Timeout".to_string(),
    };
    let report = RunReport {
        seed,
        outcome,
        waves_survived: snapshot.waves_completed,
        seconds: snapshot.elapsed_secs,
        rebellions,
        friendly_fire_incidents: friendly_fire,
        enemies_spawned: spawned,
        snapshot,
    };

    match args.format.as_str() {
        "text" => print_text(&report),
        "json" => print_json(&report),
        _ => {
            eprintln!("Unknown format '{}', defaulting to json", args.format);
            print_json(&report);
        }
    }
}

/// Spread the power pool over the non-rebel population in role priority
/// order. Rebels are cut off.
fn allocate_evenly(siege: &mut Siege, food: f32) {
    siege.set_food_percentage(food);

    let mut order: Vec<_> = siege
        .villagers()
        .iter()
        .map(|v| (v.role.priority(), v.id, v.is_rebel(), v.stats().power()))
        .collect();
    order.sort_by_key(|(priority, ..)| *priority);

    let supported = order.iter().filter(|(_, _, rebel, _)| !rebel).count() as u32;
    let pool = siege.ledger().total_power();
    let share = if supported == 0 { 0 } else { (pool / supported).min(4) };
    let mut leftover = pool.saturating_sub(share * supported);

    let mut targets = Vec::with_capacity(order.len());
    for (_, id, rebel, current) in &order {
        let target = if *rebel {
            0
        } else {
            let extra = leftover.min(4 - share);
            leftover -= extra;
            share + extra
        };
        targets.push((*id, *current, target));
    }

    // Release power before handing it out so the pool can fund every target
    let lowering = targets.iter().filter(|(_, current, target)| target < current);
    let raising = targets.iter().filter(|(_, current, target)| target > current);
    for (id, _, target) in lowering.chain(raising) {
        if let Err(e) = siege.allocate_power(*id, *target as i32) {
            tracing::warn!("allocation failed: {}", e);
        }
    }
}

fn print_json(report: &RunReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize report: {}", e);
            process::exit(1);
        }
    }
}

fn print_text(report: &RunReport) {
    let snap = &report.snapshot;
    println!("Siege Result");
    println!("============");
    println!("Outcome: {}", report.outcome);
    println!("Waves survived: {} / {}", report.waves_survived, snap.max_waves);
    println!("Simulated time: {:.1}s", report.seconds);
    println!();
    println!(
        "Population: {} loyal, {} angry, {} rebel, {} fallen",
        snap.population.loyal, snap.population.angry, snap.population.rebel, snap.population.fallen
    );
    println!("Rebellions: {}", report.rebellions);
    println!("Friendly fire incidents: {}", report.friendly_fire_incidents);
    println!("Enemies spawned: {}", report.enemies_spawned);
    println!("Power: {} total, {} unallocated", snap.total_power, snap.unallocated_power);
    println!("Player HP: {}", snap.player_hp);
    println!();
    for v in &snap.villagers {
        println!(
            "  {:<8} {:<9} {:<6} tier {} discontent {:>5.1} hp {}/{}",
            v.name,
            format!("{:?}", v.role),
            format!("{:?}", v.loyalty),
            v.tier,
            v.discontent,
            v.hp,
            v.max_hp
        );
    }
    println!();
    println!("Seed: {}", report.seed);
}
