//! Wires the entity step into the core scheduler.

use crate::factory::{spawn_population, EntityTemplate};
use crate::spatial::SpatialGrid;
use crate::step::update;
use arena_core::{System, World, WorldBounds};
use log::{debug, trace};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Default edge length of a spatial grid cell, in world units.
pub const DEFAULT_CELL_SIZE: f32 = 100.0;

/// Runs [`update`] over a [`World`] once per tick.
///
/// Owns the simulation's random source so a run can be replayed from its seed.
pub struct EntitySimulationSystem {
    rng: ChaCha8Rng,
    grid: SpatialGrid,
}

impl EntitySimulationSystem {
    pub fn new(bounds: &WorldBounds, cell_size: f32, seed: u64) -> Self {
        let grid = SpatialGrid::new(bounds, cell_size);
        let (cols, rows) = grid.dimensions();
        debug!("spatial grid: {cols}x{rows} cells of {cell_size} units");
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            grid,
        }
    }

    /// Restart the random sequence, e.g. before replaying a recorded run.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Appends `count` freshly created entities to the world, drawing from this
    /// system's random source.
    pub fn populate(&mut self, world: &mut World, count: usize, template: &EntityTemplate) {
        let spawned = spawn_population(count, template, &world.bounds, &mut self.rng);
        world.entities.extend(spawned);
    }
}

impl System for EntitySimulationSystem {
    fn name(&self) -> &str {
        "entity_simulation"
    }

    fn run(&mut self, world: &mut World) {
        let bounds = world.bounds;
        self.grid.rebuild(&world.entities, &world.players);
        trace!("tick {}: {} actors in grid", world.tick, self.grid.occupancy());

        let report = update(
            &mut world.entities,
            &mut world.players,
            &self.grid,
            &bounds,
            &mut self.rng,
        );

        if !report.is_quiet() {
            debug!(
                "tick {}: {} births, {} entity deaths, {} player deaths",
                world.tick, report.births, report.entity_deaths, report.player_deaths
            );
        }
    }
}
