//! Region quadtree for the arena broad phase.
//!
//! This crate contains:
//! - `Rectangle`, the closed axis-aligned box used for node boundaries and queries
//! - `Quadtree`, a per-frame index over borrowed points
//! - `Locate`, the trait the index reads positions through

mod error;
mod rectangle;
mod tree;

pub use error::InsertError;
pub use rectangle::Rectangle;
pub use tree::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, Node, Quadtree, TreeStats};

/// Anything with a readable position in arena coordinates.
///
/// The index never copies or mutates what it stores; it keeps `&T` and reads
/// the position through this trait.
pub trait Locate {
    fn x(&self) -> f32;
    fn y(&self) -> f32;
}

impl Locate for glam::Vec2 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
}

impl Locate for (f32, f32) {
    #[inline]
    fn x(&self) -> f32 {
        self.0
    }

    #[inline]
    fn y(&self) -> f32 {
        self.1
    }
}
