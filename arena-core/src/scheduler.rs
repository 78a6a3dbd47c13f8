use crate::{System, World};
use log::trace;
use std::time::{Duration, Instant};

/// Runs registered systems in order, once per tick.
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
    fixed_timestep: Option<Duration>, // Target tick length the caller paces against
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            fixed_timestep: None,
        }
    }

    /// Add a system to the end of the run order
    pub fn add_system<T: System + 'static>(&mut self, system: T) {
        self.systems.push(Box::new(system));
    }

    /// Set a fixed timestep for deterministic simulation
    pub fn with_fixed_timestep(&mut self, timestep: Duration) -> &mut Self {
        self.fixed_timestep = Some(timestep);
        self
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.fixed_timestep
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Run every system once, advance the world tick, and return how long the pass took.
    pub fn execute_once(&mut self, world: &mut World) -> Duration {
        let start = Instant::now();

        for system in &mut self.systems {
            let system_start = Instant::now();
            system.run(world);
            trace!(
                "tick {} system {} took {:?}",
                world.tick,
                system.name(),
                system_start.elapsed()
            );
        }

        world.tick += 1;
        start.elapsed()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
