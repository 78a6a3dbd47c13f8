use arena_simulation::{EntityTemplate, DEFAULT_CELL_SIZE};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

// --- Error Type ---
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

// --- Configuration Sections ---

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WorldSettings {
    pub width: f32,
    pub height: f32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InitialState {
    pub entities: usize,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SpatialGridConfig {
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
}

fn default_cell_size() -> f32 { DEFAULT_CELL_SIZE }

impl Default for SpatialGridConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
        }
    }
}

// --- Top-Level Config Struct ---

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_framerate")]
    pub framerate: u32,
    pub world_settings: WorldSettings,
    pub initial_state: InitialState,
    #[serde(default)]
    pub spatial_grid: SpatialGridConfig,
    /// Starting physiology for spawned entities.
    #[serde(default)]
    pub entity: EntityTemplate,
    /// Seed for the simulation RNG; a random one is picked when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Ticks between population reports in the log (0 disables them).
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
}

fn default_framerate() -> u32 { 60 }
fn default_report_interval() -> u64 { 300 }

// --- Loading Functions ---

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.framerate == 0 {
        return Err(ConfigError::Validation("Framerate cannot be zero.".to_string()));
    }

    let world = &config.world_settings;
    if !(world.width > 0.0 && world.height > 0.0) {
        return Err(ConfigError::Validation(
            "World dimensions must be positive.".to_string(),
        ));
    }

    if !(config.spatial_grid.cell_size > 0.0) {
        return Err(ConfigError::Validation(
            "Spatial grid cell size must be positive.".to_string(),
        ));
    }

    let entity = &config.entity;
    if !(entity.friction > 0.0 && entity.friction <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "Entity friction must be in (0, 1], got {}.",
            entity.friction
        )));
    }
    if !(entity.max_energy > 0.0) {
        return Err(ConfigError::Validation(
            "Entity max_energy must be positive.".to_string(),
        ));
    }
    if entity.max_speed < 0.0 || entity.rotation_speed < 0.0 || entity.base_radius <= 0.0 {
        return Err(ConfigError::Validation(
            "Entity speeds must be non-negative and base_radius positive.".to_string(),
        ));
    }
    if entity.base_radius * 2.0 > world.width.min(world.height) {
        return Err(ConfigError::Validation(
            "Entities must fit inside the world.".to_string(),
        ));
    }

    Ok(())
}
