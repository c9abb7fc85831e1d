//! World state management.
//!
//! Owns every body in the arena and builds the per-frame quadtree over them.

use crate::entity::Body;
use glam::Vec2;
use quadtree::{Quadtree, Rectangle};
use rand::Rng;
use rand_distr::Normal;
use std::collections::HashSet;
use std::f32::consts::TAU;
use tracing::warn;

/// The arena and the bodies moving through it.
#[derive(Debug)]
pub struct World {
    /// Next body ID to assign.
    next_body_id: u32,
    /// Fixed arena boundary.
    pub border: Rectangle,
    /// All live bodies.
    pub bodies: Vec<Body>,
}

impl World {
    pub fn new(border: Rectangle) -> Self {
        Self {
            next_body_id: 1,
            border,
            bodies: Vec::with_capacity(256),
        }
    }

    /// Get the next body ID.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_body_id;
        self.next_body_id = self.next_body_id.wrapping_add(1);
        if self.next_body_id == 0 {
            self.next_body_id = 1; // Skip 0
        }
        id
    }

    /// Add a body and return its ID.
    pub fn add_body(&mut self, position: Vec2, velocity: Vec2, radius: f32) -> u32 {
        let id = self.next_id();
        self.bodies.push(Body::new(id, position, velocity, radius));
        id
    }

    /// Place up to `count` bodies evenly on a circle around `center`, each
    /// heading in a random direction at `speed`.
    ///
    /// A position is discarded when it lies within `radius` of an already
    /// placed body on both axes, or closer than `radius` to the border.
    /// Returns the number of bodies added.
    pub fn spawn_ring(&mut self, count: usize, center: Vec2, generation_radius: f32, radius: f32, speed: f32) -> usize {
        let mut rng = rand::rng();
        let mut placed: Vec<Vec2> = Vec::with_capacity(count);

        for i in 0..count {
            let angle = i as f32 * TAU / count as f32;
            let pos = center + generation_radius * Vec2::from_angle(angle);
            if self.is_crowded(&placed, pos, radius) || !self.fits(pos, radius) {
                continue;
            }
            placed.push(pos);
        }

        for &pos in &placed {
            let heading = Vec2::from_angle(rng.random_range(0.0..TAU));
            self.add_body(pos, heading * speed, radius);
        }
        placed.len()
    }

    /// Place up to `count` bodies uniformly inside the border.
    ///
    /// Each velocity component has a magnitude in `[min_speed, max_speed]`
    /// and a random sign, so no body moves parallel to an axis. Crowded
    /// positions are discarded as in [`World::spawn_ring`].
    pub fn spawn_random(&mut self, count: usize, radius: f32, min_speed: f32, max_speed: f32) -> usize {
        let mut rng = rand::rng();
        let mut placed: Vec<Vec2> = Vec::with_capacity(count);
        let inner_w = (self.border.width - 2.0 * radius).max(0.0);
        let inner_h = (self.border.height - 2.0 * radius).max(0.0);

        for _ in 0..count {
            let pos = Vec2::new(
                self.border.x + radius + rng.random::<f32>() * inner_w,
                self.border.y + radius + rng.random::<f32>() * inner_h,
            );
            if self.is_crowded(&placed, pos, radius) {
                continue;
            }
            placed.push(pos);
        }

        for &pos in &placed {
            let velocity = random_velocity(&mut rng, min_speed, max_speed);
            self.add_body(pos, velocity, radius);
        }
        placed.len()
    }

    /// Place up to `count` bodies normally distributed around the border's
    /// centre, with a standard deviation of half the border on each axis.
    ///
    /// Samples that would not fit inside the border are redrawn, up to eight
    /// draws per body. Velocities and crowding follow [`World::spawn_random`].
    pub fn spawn_gaussian(&mut self, count: usize, radius: f32, min_speed: f32, max_speed: f32) -> usize {
        let center = self.border.center();
        let (Ok(x_dist), Ok(y_dist)) = (
            Normal::new(center.x, self.border.width / 2.0),
            Normal::new(center.y, self.border.height / 2.0),
        ) else {
            warn!("Cannot spread bodies over arena {}", self.border);
            return 0;
        };

        let mut rng = rand::rng();
        let mut placed: Vec<Vec2> = Vec::with_capacity(count);
        for _ in 0..count {
            let sample = (0..8)
                .map(|_| Vec2::new(rng.sample(x_dist), rng.sample(y_dist)))
                .find(|&pos| self.fits(pos, radius));
            match sample {
                Some(pos) if !self.is_crowded(&placed, pos, radius) => placed.push(pos),
                _ => {}
            }
        }

        for &pos in &placed {
            let velocity = random_velocity(&mut rng, min_speed, max_speed);
            self.add_body(pos, velocity, radius);
        }
        placed.len()
    }

    fn is_crowded(&self, placed: &[Vec2], pos: Vec2, radius: f32) -> bool {
        self.bodies
            .iter()
            .map(|b| b.position)
            .chain(placed.iter().copied())
            .any(|other| (other.x - pos.x).abs() < radius && (other.y - pos.y).abs() < radius)
    }

    fn fits(&self, pos: Vec2, radius: f32) -> bool {
        pos.x - self.border.x >= radius
            && self.border.right() - pos.x >= radius
            && pos.y - self.border.y >= radius
            && self.border.bottom() - pos.y >= radius
    }

    /// Advance every body one frame.
    #[inline]
    pub fn step(&mut self) {
        let border = self.border;
        for body in &mut self.bodies {
            body.step(&border);
        }
    }

    /// Largest body radius, used to size collision queries.
    pub fn max_radius(&self) -> f32 {
        self.bodies.iter().map(|b| b.radius).fold(0.0, f32::max)
    }

    /// Build this frame's quadtree over every body.
    pub fn build_index(&self, capacity: usize, max_depth: u32) -> Quadtree<'_, Body> {
        let mut tree = Quadtree::with_max_depth(self.border, capacity, max_depth);
        let rejected = self.bodies.iter().filter(|&body| !tree.insert(body)).count();
        if rejected > 0 {
            warn!("{} of {} bodies were left out of the quadtree", rejected, self.bodies.len());
        }
        tree
    }

    /// Reverse every body whose centre lies within `radius` of `point`.
    /// Returns how many bodies were turned around.
    pub fn repel_from(&mut self, point: Vec2, radius: f32, capacity: usize, max_depth: u32) -> usize {
        let hits: HashSet<u32> = {
            let tree = self.build_index(capacity, max_depth);
            let region = Rectangle::from_center(point.x, point.y, radius, radius);
            tree.query_range(&region)
                .into_iter()
                .filter(|body| body.is_within(point, radius))
                .map(|body| body.id)
                .collect()
        };

        for body in self.bodies.iter_mut().filter(|b| hits.contains(&b.id)) {
            body.invert_velocity();
        }
        hits.len()
    }

    /// Get a body by ID.
    #[inline]
    pub fn get_body(&self, id: u32) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }
}

/// Each component gets a magnitude in `[min_speed, max_speed]` and a random
/// sign.
fn random_velocity(rng: &mut impl Rng, min_speed: f32, max_speed: f32) -> Vec2 {
    let mut component = || {
        let magnitude = if max_speed > min_speed {
            rng.random_range(min_speed..=max_speed)
        } else {
            min_speed
        };
        if rng.random_bool(0.5) { magnitude } else { -magnitude }
    };
    Vec2::new(component(), component())
}
