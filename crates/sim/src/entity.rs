//! Moving circular bodies.

use glam::Vec2;
use quadtree::{Locate, Rectangle};

/// A circle moving through the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Unique body ID.
    pub id: u32,
    /// Centre in arena coordinates.
    pub position: Vec2,
    /// Displacement per frame.
    pub velocity: Vec2,
    /// Collision radius.
    pub radius: f32,
    /// Whether the body overlapped another one in the last frame.
    pub colliding: bool,
}

impl Body {
    pub fn new(id: u32, position: Vec2, velocity: Vec2, radius: f32) -> Self {
        Self {
            id,
            position,
            velocity,
            radius,
            colliding: false,
        }
    }

    /// Advance one frame and bounce off the arena walls.
    ///
    /// The velocity component into a wall is reflected and the centre is
    /// clamped so the circle stays inside `border`.
    #[inline]
    pub fn step(&mut self, border: &Rectangle) {
        self.position += self.velocity;

        let (min_x, max_x) = (border.x + self.radius, border.right() - self.radius);
        let (min_y, max_y) = (border.y + self.radius, border.bottom() - self.radius);

        if self.position.x < min_x {
            self.position.x = min_x;
            self.velocity.x = self.velocity.x.abs();
        } else if self.position.x > max_x {
            self.position.x = max_x;
            self.velocity.x = -self.velocity.x.abs();
        }

        if self.position.y < min_y {
            self.position.y = min_y;
            self.velocity.y = self.velocity.y.abs();
        } else if self.position.y > max_y {
            self.position.y = max_y;
            self.velocity.y = -self.velocity.y.abs();
        }
    }

    #[inline]
    pub fn invert_velocity(&mut self) {
        self.velocity = -self.velocity;
    }

    /// Check if the centre lies within `radius` of `point`.
    #[inline]
    pub fn is_within(&self, point: Vec2, radius: f32) -> bool {
        self.position.distance_squared(point) <= radius * radius
    }
}

impl Locate for Body {
    #[inline]
    fn x(&self) -> f32 {
        self.position.x
    }

    #[inline]
    fn y(&self) -> f32 {
        self.position.y
    }
}
