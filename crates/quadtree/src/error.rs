//! Quadtree error types.

use thiserror::Error;

/// Reasons an insert can fail.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum InsertError {
    /// The point lies outside the root boundary. Expected for entities that
    /// left the arena; the tree is untouched.
    #[error("Point ({x}, {y}) lies outside the quadtree boundary")]
    OutOfBounds { x: f32, y: f32 },

    /// A node contained the point but none of its quadrants did. The point is
    /// dropped for this frame.
    #[error("No quadrant claimed point ({x}, {y})")]
    Unclaimed { x: f32, y: f32 },
}
