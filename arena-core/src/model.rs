use glam::Vec2;
use std::collections::HashMap;

/// Velocity component (absolute, per axis) above which an actor counts as moving.
pub const MOVING_THRESHOLD: f32 = 0.1;

/// Who an entity is currently chasing.
///
/// Entities are addressed by their index in the world's entity list, which is
/// why that list is append-only while a tick is running.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FollowTarget {
    Player(String),
    Entity(usize),
}

/// An autonomous, non-player organism.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    // Kinematics
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub target_angle: f32,
    pub rotation_speed: f32,
    pub speed: f32,
    pub target_speed: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub friction: f32,

    // Size
    pub radius: f32,
    pub base_radius: f32,
    pub generation: u32,

    // Energy economy
    pub energy: f32,
    pub max_energy: f32,
    pub energy_consumption_rate: f32,
    pub is_alive: bool,
    pub growth_rate: f32,

    // Reproduction, in ticks
    pub division_threshold: f32,
    pub division_cooldown: u32,
    pub division_cooldown_time: u32,

    // Behavior, in ticks
    pub follow_target: Option<FollowTarget>,
    pub follow_cooldown: u32,
    pub change_dir_cooldown: u32,
}

/// The subset of a connected player's state the entity step reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub energy: f32,
    pub max_energy: f32,
    pub energy_consumption_rate: f32,
    pub is_alive: bool,
}

impl Player {
    /// A fresh, stationary player with a full 100-unit energy pool.
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            energy: 100.0,
            max_energy: 100.0,
            energy_consumption_rate: 1.5,
            is_alive: true,
        }
    }
}

/// Players keyed by session id.
pub type Players = HashMap<String, Player>;

/// Anything with a movement-driven energy drain.
///
/// Players and entities share the same drain and death rules; this is the seam
/// that lets the simulation apply them with one function.
pub trait Metabolism {
    fn velocity(&self) -> Vec2;
    fn alive(&self) -> bool;
    fn energy(&self) -> f32;
    fn max_energy(&self) -> f32;
    fn consumption_rate(&self) -> f32;
    fn set_energy(&mut self, energy: f32);
    /// One-way transition: zeroes energy and marks the actor dead.
    fn kill(&mut self);

    fn is_moving(&self) -> bool {
        let v = self.velocity();
        v.x.abs() > MOVING_THRESHOLD || v.y.abs() > MOVING_THRESHOLD
    }
}

macro_rules! impl_metabolism {
    ($actor:ty) => {
        impl Metabolism for $actor {
            fn velocity(&self) -> Vec2 {
                self.vel
            }

            fn alive(&self) -> bool {
                self.is_alive
            }

            fn energy(&self) -> f32 {
                self.energy
            }

            fn max_energy(&self) -> f32 {
                self.max_energy
            }

            fn consumption_rate(&self) -> f32 {
                self.energy_consumption_rate
            }

            fn set_energy(&mut self, energy: f32) {
                self.energy = energy;
            }

            fn kill(&mut self) {
                self.energy = 0.0;
                self.is_alive = false;
            }
        }
    };
}

impl_metabolism!(Entity);
impl_metabolism!(Player);
