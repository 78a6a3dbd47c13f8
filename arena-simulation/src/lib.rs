//! Entity simulation for the arena: spawning, the per-tick update, and the
//! spatial lookups it depends on.

pub mod factory;
pub mod spatial;
pub mod step;
pub mod system;

pub use factory::{create_default_entity, create_entity, spawn_population, EntityTemplate};
pub use spatial::{LinearScan, NearestTarget, SpatialGrid, SpatialQuery};
pub use step::{update, StepReport, TICKS_PER_SECOND};
pub use system::{EntitySimulationSystem, DEFAULT_CELL_SIZE};
