pub mod math;
pub mod model;
pub mod scheduler;

use glam::Vec2;

pub use model::{Entity, FollowTarget, Metabolism, Player, Players, MOVING_THRESHOLD};
pub use scheduler::Scheduler;

/// Arena extents. The playable area is `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Pulls a circle's center back so the whole circle lies inside the arena.
    pub fn clamp_circle(&self, center: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            math::clamp(center.x, radius, self.width - radius),
            math::clamp(center.y, radius, self.height - radius),
        )
    }

    pub fn contains_circle(&self, center: Vec2, radius: f32) -> bool {
        center.x >= radius
            && center.x <= self.width - radius
            && center.y >= radius
            && center.y <= self.height - radius
    }
}

/// Everything one simulation tick reads and mutates.
#[derive(Debug, Clone)]
pub struct World {
    pub bounds: WorldBounds,
    /// Append-only during a tick; entities are referenced by index.
    pub entities: Vec<Entity>,
    pub players: Players,
    pub tick: u64,
}

impl World {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            entities: Vec::new(),
            players: Players::new(),
            tick: 0,
        }
    }

    pub fn alive_entities(&self) -> usize {
        self.entities.iter().filter(|e| e.is_alive).count()
    }

    pub fn alive_players(&self) -> usize {
        self.players.values().filter(|p| p.is_alive).count()
    }

    /// Deepest division lineage among living entities.
    pub fn max_generation(&self) -> Option<u32> {
        self.entities
            .iter()
            .filter(|e| e.is_alive)
            .map(|e| e.generation)
            .max()
    }
}

/// A unit of per-tick work run by the [`Scheduler`].
pub trait System {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn run(&mut self, world: &mut World);
}
