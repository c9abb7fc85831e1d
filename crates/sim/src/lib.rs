//! Headless arena simulation.
//!
//! Bodies bounce around a fixed arena; every frame a fresh quadtree narrows
//! the collision search to nearby candidates.

pub mod collision;
pub mod config;
pub mod entity;
pub mod simulation;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use simulation::{FrameStats, Simulation, run};
