//! Headless runner: loads a config, seeds a population, and drives the entity
//! simulation at a fixed tick rate.

mod stats;

use arena_config::{load_config, Config, ConfigError};
use arena_core::{Scheduler, World, WorldBounds};
use arena_simulation::EntitySimulationSystem;
use clap::Parser;
use log::{debug, error, info, warn};
use stats::TickStats;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Stop after this many ticks instead of running until interrupted
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Override the RNG seed from the configuration file
    #[arg(long)]
    seed: Option<u64>,

    /// Run ticks back to back instead of pacing to the configured framerate
    #[arg(long)]
    unpaced: bool,
}

#[derive(Error, Debug)]
enum RunnerError {
    #[error("failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("failed to set up tick statistics: {0}")]
    Stats(#[from] hdrhistogram::errors::CreationError),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), RunnerError> {
    let config = load_config(&args.config)?;
    info!("Using configuration from {}", args.config.display());

    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    info!("Simulation seed: {seed} (pass --seed {seed} to replay)");

    let (mut world, system) = initialize_world(&config, seed);
    info!(
        "Spawned {} entities in a {}x{} arena",
        world.entities.len(),
        world.bounds.width,
        world.bounds.height
    );

    let mut scheduler = build_scheduler(&config, system, args.unpaced);

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    let mut stats = TickStats::new()?;
    match scheduler.tick_duration() {
        Some(_) => info!(
            "Running {} system(s) at {} ticks per second...",
            scheduler.system_count(),
            config.framerate
        ),
        None => info!("Running {} system(s) unpaced", scheduler.system_count()),
    }

    while running.load(Ordering::SeqCst) {
        if args.ticks.is_some_and(|limit| world.tick >= limit) {
            break;
        }

        let elapsed = scheduler.execute_once(&mut world);
        stats.record(elapsed, scheduler.tick_duration());

        if config.report_interval > 0 && world.tick % config.report_interval == 0 {
            debug!("{}", population_summary(&world));
        }

        if world.alive_entities() == 0 {
            info!("No living entities remain after {} ticks", world.tick);
            break;
        }

        match scheduler.tick_duration() {
            Some(budget) if elapsed < budget => spin_sleep::sleep(budget - elapsed),
            // Only worth flagging when the target rate is high enough to matter
            Some(budget) if config.framerate > 10 => {
                warn!("Tick time exceeded budget: {:?} > {:?}", elapsed, budget);
            }
            _ => {}
        }
    }

    info!("{}", population_summary(&world));
    stats.log_summary();
    info!("Simulation stopped.");
    Ok(())
}

fn initialize_world(config: &Config, seed: u64) -> (World, EntitySimulationSystem) {
    let bounds = WorldBounds::new(config.world_settings.width, config.world_settings.height);
    let mut world = World::new(bounds);
    let mut system = EntitySimulationSystem::new(&bounds, config.spatial_grid.cell_size, seed);
    system.populate(&mut world, config.initial_state.entities, &config.entity);
    (world, system)
}

/// A paced scheduler carries the frame budget the loop sleeps against.
fn build_scheduler(config: &Config, system: EntitySimulationSystem, unpaced: bool) -> Scheduler {
    let mut scheduler = Scheduler::new();
    if !unpaced {
        scheduler.with_fixed_timestep(Duration::from_secs_f64(1.0 / config.framerate as f64));
    }
    scheduler.add_system(system);
    scheduler
}

fn population_summary(world: &World) -> String {
    format!(
        "tick {}: {} of {} entities alive, deepest generation {}, {} players alive",
        world.tick,
        world.alive_entities(),
        world.entities.len(),
        world.max_generation().map_or_else(|| "-".to_string(), |g| g.to_string()),
        world.alive_players(),
    )
}
