//! Collision detection.
//!
//! The quadtree narrows each body's neighbourhood to a handful of candidates;
//! the exact circle test runs only on those.

use crate::entity::Body;
use fixedbitset::FixedBitSet;
use quadtree::{Quadtree, Rectangle};
use std::collections::HashMap;

/// Check if two circles overlap. Touching circles do not collide.
#[inline]
pub fn circles_overlap(a: &Body, b: &Body) -> bool {
    let r = a.radius + b.radius;
    a.position.distance_squared(b.position) < r * r
}

/// Outcome of one frame's collision pass.
#[derive(Debug, Clone, Default)]
pub struct CollisionReport {
    /// Colliding pairs as `(lower id, higher id)`, sorted.
    pub pairs: Vec<(u32, u32)>,
    /// Exact circle tests performed.
    pub checks: usize,
    /// Indices into the body slice of every body in at least one pair.
    pub colliding: FixedBitSet,
}

impl CollisionReport {
    #[inline]
    pub fn is_colliding(&self, index: usize) -> bool {
        self.colliding.contains(index)
    }
}

/// Search box around a body: anything it can touch has its centre inside.
#[inline]
pub fn query_region(body: &Body, max_radius: f32) -> Rectangle {
    let reach = body.radius + max_radius;
    Rectangle::from_center(body.position.x, body.position.y, reach, reach)
}

/// Find every overlapping pair among `bodies` using `tree` as the broad phase.
///
/// `tree` must have been built over `bodies` this frame. `max_radius` is the
/// largest radius in the slice. `scratch` is cleared and reused for every
/// query.
pub fn find_collisions<'a>(
    tree: &Quadtree<'a, Body>,
    bodies: &'a [Body],
    max_radius: f32,
    scratch: &mut Vec<&'a Body>,
) -> CollisionReport {
    let index_of: HashMap<u32, usize> = bodies.iter().enumerate().map(|(i, b)| (b.id, i)).collect();
    let mut report = CollisionReport {
        colliding: FixedBitSet::with_capacity(bodies.len()),
        ..CollisionReport::default()
    };

    for (i, body) in bodies.iter().enumerate() {
        scratch.clear();
        tree.query_range_into(&query_region(body, max_radius), scratch);

        for &other in scratch.iter() {
            if std::ptr::eq(body, other) {
                continue;
            }
            report.checks += 1;
            if !circles_overlap(body, other) {
                continue;
            }

            report.colliding.insert(i);
            // Both bodies see each other; record the pair from the lower id.
            if body.id < other.id {
                report.pairs.push((body.id, other.id));
                if let Some(&j) = index_of.get(&other.id) {
                    report.colliding.insert(j);
                }
            }
        }
    }

    report.pairs.sort_unstable();
    report
}

/// O(n²) reference pass: every overlapping pair, sorted.
pub fn brute_force_collisions(bodies: &[Body]) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            if circles_overlap(a, b) {
                pairs.push((a.id.min(b.id), a.id.max(b.id)));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;
    use glam::Vec2;

    fn body(id: u32, x: f32, y: f32, radius: f32) -> Body {
        Body::new(id, Vec2::new(x, y), Vec2::ZERO, radius)
    }

    fn run(bodies: &[Body], capacity: usize) -> CollisionReport {
        let mut tree = Quadtree::new(Rectangle::new(0.0, 0.0, 700.0, 700.0), capacity);
        for b in bodies {
            assert!(tree.insert(b));
        }
        let max_radius = bodies.iter().map(|b| b.radius).fold(0.0, f32::max);
        find_collisions(&tree, bodies, max_radius, &mut Vec::new())
    }

    #[test]
    fn test_overlap() {
        assert!(circles_overlap(&body(1, 0.0, 0.0, 50.0), &body(2, 30.0, 0.0, 20.0)));
        assert!(!circles_overlap(&body(1, 0.0, 0.0, 10.0), &body(2, 100.0, 0.0, 10.0)));
        // Touching is not overlapping.
        assert!(!circles_overlap(&body(1, 0.0, 0.0, 10.0), &body(2, 20.0, 0.0, 10.0)));
    }

    #[test]
    fn test_finds_pair_once() {
        let bodies = [
            body(1, 100.0, 100.0, 25.0),
            body(2, 130.0, 100.0, 25.0),
            body(3, 600.0, 600.0, 25.0),
        ];
        let report = run(&bodies, 1);

        assert_eq!(report.pairs, vec![(1, 2)]);
        assert!(report.is_colliding(0));
        assert!(report.is_colliding(1));
        assert!(!report.is_colliding(2));
        assert_eq!(report.checks, 2);
    }

    #[test]
    fn test_coincident_bodies_collide() {
        let bodies = [body(7, 200.0, 200.0, 5.0), body(3, 200.0, 200.0, 5.0), body(5, 200.0, 200.0, 5.0)];
        let report = run(&bodies, 1);
        assert_eq!(report.pairs, vec![(3, 5), (3, 7), (5, 7)]);
        assert_eq!(report.colliding.count_ones(..), 3);
    }

    #[test]
    fn test_mixed_radii_reach_small_neighbours() {
        // The small body's own reach (2 + 40) is what must cover the big one.
        let bodies = [body(1, 300.0, 300.0, 40.0), body(2, 340.0, 300.0, 2.0)];
        let report = run(&bodies, 4);
        assert_eq!(report.pairs, vec![(1, 2)]);
    }

    #[test]
    fn test_matches_brute_force_on_random_world() {
        let mut world = World::new(Rectangle::new(0.0, 0.0, 700.0, 700.0));
        world.spawn_random(300, 8.0, 0.2, 1.0);
        for _ in 0..200 {
            world.step();
        }

        let tree = world.build_index(2, 12);
        let report = find_collisions(&tree, &world.bodies, world.max_radius(), &mut Vec::new());
        assert_eq!(report.pairs, brute_force_collisions(&world.bodies));

        let n = world.bodies.len();
        assert!(report.checks < n * (n - 1));
    }
}
