//! Axis-aligned rectangle used for node boundaries and range queries.

use crate::Locate;
use glam::Vec2;
use std::fmt;

/// Axis-aligned box in top-left-origin form.
///
/// All four edges are closed: a point lying exactly on an edge is contained,
/// and two rectangles that only touch along an edge or corner intersect.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Create a rectangle from its center and half extents.
    #[inline]
    pub fn from_center(cx: f32, cy: f32, half_width: f32, half_height: f32) -> Self {
        Self {
            x: cx - half_width,
            y: cy - half_height,
            width: half_width * 2.0,
            height: half_height * 2.0,
        }
    }

    /// X coordinate of the right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point lies inside or on the edge of this rectangle.
    #[inline]
    pub fn contains<P: Locate + ?Sized>(&self, point: &P) -> bool {
        let (px, py) = (point.x(), point.y());
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Check if two rectangles overlap or touch.
    #[inline]
    pub fn intersects(&self, other: &Rectangle) -> bool {
        !(other.x > self.right()
            || other.right() < self.x
            || other.y > self.bottom()
            || other.bottom() < self.y)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.width, self.height)
    }
}
