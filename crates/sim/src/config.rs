//! Simulation configuration.

use glam::Vec2;
use quadtree::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, Rectangle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub quadtree: QuadtreeConfig,
    #[serde(default)]
    pub spawn: SpawnConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub hazard: HazardConfig,
}

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Arena must have a positive size, got {width}x{height}")]
    EmptyArena { width: f32, height: f32 },

    #[error("Quadtree capacity must be at least 1")]
    ZeroCapacity,

    #[error("Quadtree max_depth must be at least 1")]
    ZeroDepth,

    #[error("Quadtree max_depth {0} exceeds the limit of {limit}", limit = MAX_DEPTH_LIMIT)]
    DepthTooLarge(u32),

    #[error("Body radius must be positive, got {0}")]
    InvalidRadius(f32),

    #[error("Body radius {radius} does not fit a {width}x{height} arena")]
    RadiusTooLarge { radius: f32, width: f32, height: f32 },

    #[error("Hazard radius must be positive, got {0}")]
    InvalidHazardRadius(f32),

    #[error("Speed range is invalid: min {min}, max {max}")]
    InvalidSpeedRange { min: f32, max: f32 },
}

impl Config {
    /// Load configuration from `path`, writing the defaults there if it does
    /// not exist yet.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let arena = &self.arena;
        if !(arena.width > 0.0 && arena.height > 0.0) {
            return Err(ConfigError::EmptyArena {
                width: arena.width,
                height: arena.height,
            });
        }
        if self.quadtree.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.quadtree.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.quadtree.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::DepthTooLarge(self.quadtree.max_depth));
        }
        let spawn = &self.spawn;
        if !(spawn.radius > 0.0) {
            return Err(ConfigError::InvalidRadius(spawn.radius));
        }
        // A body must fit between opposite walls or it cannot stay inside.
        if 2.0 * spawn.radius > arena.width.min(arena.height) {
            return Err(ConfigError::RadiusTooLarge {
                radius: spawn.radius,
                width: arena.width,
                height: arena.height,
            });
        }
        if !(spawn.min_speed > 0.0 && spawn.min_speed <= spawn.max_speed) {
            return Err(ConfigError::InvalidSpeedRange {
                min: spawn.min_speed,
                max: spawn.max_speed,
            });
        }
        if self.hazard.interval > 0 && !(self.hazard.radius > 0.0) {
            return Err(ConfigError::InvalidHazardRadius(self.hazard.radius));
        }
        Ok(())
    }
}

/// The fixed arena every frame's quadtree covers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArenaConfig {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_arena_size")]
    pub width: f32,
    #[serde(default = "default_arena_size")]
    pub height: f32,
}

impl ArenaConfig {
    pub fn boundary(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.height)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: default_arena_size(),
            height: default_arena_size(),
        }
    }
}

fn default_arena_size() -> f32 {
    700.0
}

/// Split policy for the per-frame tree.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuadtreeConfig {
    /// Points a node holds before it subdivides.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Depth at which nodes stop subdividing.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_capacity() -> usize {
    2
}
fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

/// How initial bodies are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnLayout {
    /// Uniformly at random inside the arena.
    #[default]
    Random,
    /// Evenly spaced on a circle around the arena centre.
    Ring,
    /// Normally distributed around the arena centre.
    Gaussian,
}

/// Initial body population.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpawnConfig {
    #[serde(default)]
    pub layout: SpawnLayout,
    /// Bodies to attempt to place (crowded placements are discarded).
    #[serde(default = "default_count")]
    pub count: usize,
    /// Collision radius of every body.
    #[serde(default = "default_radius")]
    pub radius: f32,
    /// Speed of ring bodies.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Per-axis speed range of randomly and normally placed bodies.
    #[serde(default = "default_min_speed")]
    pub min_speed: f32,
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// Radius of the ring layout.
    #[serde(default = "default_generation_radius")]
    pub generation_radius: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            layout: SpawnLayout::default(),
            count: default_count(),
            radius: default_radius(),
            speed: default_speed(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            generation_radius: default_generation_radius(),
        }
    }
}

fn default_count() -> usize {
    100
}
fn default_radius() -> f32 {
    25.0
}
fn default_speed() -> f32 {
    0.8
}
fn default_min_speed() -> f32 {
    0.2
}
fn default_max_speed() -> f32 {
    1.0
}
fn default_generation_radius() -> f32 {
    200.0
}

/// Frame loop settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Frames to run before exiting (0 = until interrupted).
    #[serde(default)]
    pub frames: u64,
    /// Log a frame summary every this many frames (0 = never).
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,
    /// Cross-check every frame's pairs against an O(n²) scan.
    #[serde(default)]
    pub verify: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            frames: 0,
            stats_interval: default_stats_interval(),
            verify: false,
        }
    }
}

/// A repelling zone that pulses every `interval` frames. Bodies whose
/// centre lies within `radius` of the zone centre reverse direction.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HazardConfig {
    /// Frames between pulses (0 = disabled).
    #[serde(default)]
    pub interval: u64,
    #[serde(default = "default_hazard_position")]
    pub x: f32,
    #[serde(default = "default_hazard_position")]
    pub y: f32,
    #[serde(default = "default_hazard_radius")]
    pub radius: f32,
}

impl HazardConfig {
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            interval: 0,
            x: default_hazard_position(),
            y: default_hazard_position(),
            radius: default_hazard_radius(),
        }
    }
}

fn default_hazard_position() -> f32 {
    350.0
}
fn default_hazard_radius() -> f32 {
    50.0
}

fn default_tick_interval() -> u64 {
    16
}
fn default_stats_interval() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.arena.boundary(), Rectangle::new(0.0, 0.0, 700.0, 700.0));
        assert_eq!(config.quadtree.capacity, 2);
        assert_eq!(config.quadtree.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [arena]
            width = 1200.0

            [spawn]
            layout = "ring"
            count = 4

            [simulation]
            frames = 10
            verify = true

            [hazard]
            interval = 120
            radius = 80.0
            "#,
        )
        .unwrap();

        assert_eq!(config.arena.width, 1200.0);
        assert_eq!(config.arena.height, 700.0);
        assert_eq!(config.spawn.layout, SpawnLayout::Ring);
        assert_eq!(config.spawn.count, 4);
        assert_eq!(config.spawn.radius, 25.0);
        assert_eq!(config.simulation.frames, 10);
        assert!(config.simulation.verify);
        assert_eq!(config.simulation.tick_interval_ms, 16);
        assert_eq!(config.hazard.interval, 120);
        assert_eq!(config.hazard.center(), Vec2::new(350.0, 350.0));
        assert_eq!(config.hazard.radius, 80.0);

        let config: Config = toml::from_str("[spawn]\nlayout = \"gaussian\"\n").unwrap();
        assert_eq!(config.spawn.layout, SpawnLayout::Gaussian);
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.quadtree.capacity = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));

        let mut config = Config::default();
        config.arena.height = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::EmptyArena { .. })));

        let mut config = Config::default();
        config.spawn.min_speed = 2.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSpeedRange { .. })));

        let mut config = Config::default();
        config.spawn.radius = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRadius(_))));

        let mut config = Config::default();
        config.quadtree.max_depth = MAX_DEPTH_LIMIT;
        assert!(config.validate().is_ok());
        config.quadtree.max_depth = MAX_DEPTH_LIMIT + 1;
        assert_eq!(config.validate(), Err(ConfigError::DepthTooLarge(MAX_DEPTH_LIMIT + 1)));

        let mut config = Config::default();
        config.arena.height = 100.0;
        config.spawn.radius = 50.0;
        assert!(config.validate().is_ok());
        config.spawn.radius = 50.5;
        assert!(matches!(config.validate(), Err(ConfigError::RadiusTooLarge { .. })));

        let mut config = Config::default();
        config.hazard.radius = 0.0;
        assert!(config.validate().is_ok());
        config.hazard.interval = 30;
        assert_eq!(config.validate(), Err(ConfigError::InvalidHazardRadius(0.0)));
    }

    #[test]
    fn test_load_writes_defaults_then_reads_them_back() {
        let path = std::env::temp_dir().join(format!("arena-sim-config-{}.toml", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let written = Config::load(&path).unwrap();
        assert!(path.exists());
        let read = Config::load(&path).unwrap();
        assert_eq!(written, read);

        std::fs::write(&path, "[quadtree]\ncapacity = 0\n").unwrap();
        assert!(Config::load(&path).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
