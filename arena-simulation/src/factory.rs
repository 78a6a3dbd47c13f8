//! Construction of fresh entities with randomized kinematic state.

use arena_core::{Entity, WorldBounds};
use glam::Vec2;
use rand::Rng;
use serde::Deserialize;
use std::f32::consts::TAU;

/// Physiological and kinematic constants every new entity starts from.
///
/// Also the `entity` section of the config file, where every field is optional.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EntityTemplate {
    pub max_speed: f32,
    pub acceleration: f32,
    pub friction: f32,
    pub rotation_speed: f32,
    pub max_energy: f32,
    pub energy_consumption_rate: f32,
    pub growth_rate: f32,
    pub base_radius: f32,
    pub division_threshold: f32,
    pub division_cooldown_time: u32,
}

impl Default for EntityTemplate {
    fn default() -> Self {
        Self {
            max_speed: 3.0,
            acceleration: 0.1,
            friction: 0.98,
            rotation_speed: 0.04,
            max_energy: 100.0,
            energy_consumption_rate: 1.5,
            growth_rate: 0.1,
            base_radius: 18.0,
            division_threshold: 150.0,
            division_cooldown_time: 600, // ~10s at 60 ticks/s
        }
    }
}

impl EntityTemplate {
    /// The physiology an offspring inherits from its parent.
    pub fn inherited_from(parent: &Entity) -> Self {
        Self {
            max_speed: parent.max_speed,
            acceleration: parent.acceleration,
            friction: parent.friction,
            rotation_speed: parent.rotation_speed,
            max_energy: parent.max_energy,
            energy_consumption_rate: parent.energy_consumption_rate,
            growth_rate: parent.growth_rate,
            base_radius: parent.base_radius,
            division_threshold: parent.division_threshold,
            division_cooldown_time: parent.division_cooldown_time,
        }
    }
}

/// Builds an entity at a random spot in the arena, at full energy, heading and
/// cruising speed drawn uniformly.
pub fn create_entity<R: Rng + ?Sized>(
    template: &EntityTemplate,
    bounds: &WorldBounds,
    rng: &mut R,
) -> Entity {
    Entity {
        pos: Vec2::new(
            rng.gen::<f32>() * bounds.width,
            rng.gen::<f32>() * bounds.height,
        ),
        vel: Vec2::ZERO,
        angle: rng.gen::<f32>() * TAU,
        target_angle: rng.gen::<f32>() * TAU,
        rotation_speed: template.rotation_speed,
        speed: 0.0,
        target_speed: rng.gen::<f32>() * template.max_speed,
        max_speed: template.max_speed,
        acceleration: template.acceleration,
        friction: template.friction,

        radius: template.base_radius,
        base_radius: template.base_radius,
        generation: 0,

        energy: template.max_energy,
        max_energy: template.max_energy,
        energy_consumption_rate: template.energy_consumption_rate,
        is_alive: true,
        growth_rate: template.growth_rate,

        division_threshold: template.division_threshold,
        division_cooldown: 0,
        division_cooldown_time: template.division_cooldown_time,

        follow_target: None,
        follow_cooldown: 0,
        change_dir_cooldown: 0,
    }
}

pub fn create_default_entity<R: Rng + ?Sized>(bounds: &WorldBounds, rng: &mut R) -> Entity {
    create_entity(&EntityTemplate::default(), bounds, rng)
}

/// Seeds the initial population.
pub fn spawn_population<R: Rng + ?Sized>(
    count: usize,
    template: &EntityTemplate,
    bounds: &WorldBounds,
    rng: &mut R,
) -> Vec<Entity> {
    (0..count)
        .map(|_| create_entity(template, bounds, rng))
        .collect()
}
