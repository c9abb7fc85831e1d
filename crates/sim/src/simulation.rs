//! Frame loop.
//!
//! Every frame moves the bodies, builds a fresh quadtree over them, runs the
//! collision pass and drops the tree again.

use crate::collision::{brute_force_collisions, find_collisions};
use crate::config::{Config, SpawnLayout};
use crate::world::World;
use quadtree::TreeStats;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

/// Per-frame measurements.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub frame: u64,
    pub bodies: usize,
    /// Exact circle tests performed this frame.
    pub checks: usize,
    pub collisions: usize,
    /// Bodies turned around by the hazard this frame.
    pub repelled: usize,
    pub tree: TreeStats,
    pub elapsed: Duration,
}

/// Running simulation state.
#[derive(Debug)]
pub struct Simulation {
    pub config: Config,
    pub world: World,
    pub frame: u64,
}

impl Simulation {
    /// Create the world and spawn the configured bodies.
    pub fn new(config: Config) -> Self {
        let mut world = World::new(config.arena.boundary());
        let center = world.border.center();
        let spawn = &config.spawn;
        let added = match spawn.layout {
            SpawnLayout::Ring => world.spawn_ring(
                spawn.count,
                center,
                spawn.generation_radius,
                spawn.radius,
                spawn.speed,
            ),
            SpawnLayout::Random => world.spawn_random(spawn.count, spawn.radius, spawn.min_speed, spawn.max_speed),
            SpawnLayout::Gaussian => world.spawn_gaussian(spawn.count, spawn.radius, spawn.min_speed, spawn.max_speed),
        };
        if added < spawn.count {
            debug!("Discarded {} crowded spawn positions", spawn.count - added);
        }

        Self { config, world, frame: 0 }
    }

    /// Run a single frame.
    pub fn tick(&mut self) -> FrameStats {
        let tick_start = std::time::Instant::now();
        self.frame += 1;

        self.world.step();

        let capacity = self.config.quadtree.capacity;
        let max_depth = self.config.quadtree.max_depth;

        let hazard = &self.config.hazard;
        let repelled = if hazard.interval > 0 && self.frame % hazard.interval == 0 {
            let turned = self.world.repel_from(hazard.center(), hazard.radius, capacity, max_depth);
            debug!("Frame #{}: hazard at {} turned {} bodies", self.frame, hazard.center(), turned);
            turned
        } else {
            0
        };
        let (report, tree_stats) = {
            let tree = self.world.build_index(capacity, max_depth);
            let mut scratch = Vec::with_capacity(64);
            let report = find_collisions(&tree, &self.world.bodies, self.world.max_radius(), &mut scratch);
            (report, tree.stats())
        };

        if self.config.simulation.verify {
            let expected = brute_force_collisions(&self.world.bodies);
            if expected != report.pairs {
                error!(
                    "Frame #{}: quadtree found {} pairs, linear scan found {}",
                    self.frame,
                    report.pairs.len(),
                    expected.len()
                );
            }
        }

        for (i, body) in self.world.bodies.iter_mut().enumerate() {
            body.colliding = report.is_colliding(i);
        }

        let stats = FrameStats {
            frame: self.frame,
            bodies: self.world.bodies.len(),
            checks: report.checks,
            collisions: report.pairs.len(),
            repelled,
            tree: tree_stats,
            elapsed: tick_start.elapsed(),
        };

        let interval = self.config.simulation.stats_interval;
        if interval > 0 && self.frame % interval == 0 {
            debug!(
                "Frame #{}: {:.3}ms | {} bodies, {} checks, {} collisions | tree: {} nodes, depth {}, {} overfull",
                stats.frame,
                stats.elapsed.as_secs_f64() * 1000.0,
                stats.bodies,
                stats.checks,
                stats.collisions,
                stats.tree.nodes,
                stats.tree.max_depth_reached,
                stats.tree.overfull_leaves
            );
        }

        stats
    }
}

/// Run the frame loop until the configured frame count or Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let tick_interval_ms = config.simulation.tick_interval_ms.max(1);
    let frames = config.simulation.frames;
    let mut sim = Simulation::new(config);
    info!("Spawned {} bodies in arena {}", sim.world.bodies.len(), sim.world.border);

    let start = Instant::now() + Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let tick_budget = tick_interval_ms as f64 * 0.9;
    let mut total_checks = 0usize;
    let mut total_collisions = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = &mut shutdown => {
                result?;
                info!("Interrupted, stopping");
                break;
            }
        }

        let stats = sim.tick();
        total_checks += stats.checks;
        total_collisions += stats.collisions;

        let tick_ms = stats.elapsed.as_secs_f64() * 1000.0;
        if tick_ms > tick_budget {
            warn!(
                "Slow frame #{}: {:.3}ms (budget: {:.1}ms) - {} bodies",
                stats.frame, tick_ms, tick_budget, stats.bodies
            );
        }

        if frames > 0 && sim.frame >= frames {
            break;
        }
    }

    info!(
        "Ran {} frames: {} checks, {} collisions",
        sim.frame, total_checks, total_collisions
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::default();
        config.spawn.count = 60;
        config.spawn.radius = 10.0;
        config.simulation.verify = true;
        config
    }

    #[test]
    fn test_tick_counts_frames_and_indexes_everything() {
        let mut sim = Simulation::new(config());
        let bodies = sim.world.bodies.len();
        assert!(bodies > 0);

        for expected in 1..=5 {
            let stats = sim.tick();
            assert_eq!(stats.frame, expected);
            assert_eq!(stats.bodies, bodies);
            assert_eq!(stats.tree.items, bodies);
        }
    }

    #[test]
    fn test_tick_flags_colliding_bodies() {
        let mut config = config();
        config.spawn.count = 0;
        let mut sim = Simulation::new(config);
        sim.world.add_body(glam::Vec2::new(100.0, 100.0), glam::Vec2::ZERO, 10.0);
        sim.world.add_body(glam::Vec2::new(105.0, 100.0), glam::Vec2::ZERO, 10.0);
        sim.world.add_body(glam::Vec2::new(400.0, 400.0), glam::Vec2::ZERO, 10.0);

        let stats = sim.tick();
        assert_eq!(stats.collisions, 1);
        let flags: Vec<bool> = sim.world.bodies.iter().map(|b| b.colliding).collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn test_ring_layout() {
        let mut config = config();
        config.spawn.layout = SpawnLayout::Ring;
        config.spawn.count = 4;
        let sim = Simulation::new(config);
        assert_eq!(sim.world.bodies.len(), 4);
    }

    #[test]
    fn test_gaussian_layout() {
        let mut config = config();
        config.spawn.layout = SpawnLayout::Gaussian;
        let mut sim = Simulation::new(config);
        assert!(!sim.world.bodies.is_empty());
        assert_eq!(sim.tick().tree.items, sim.world.bodies.len());
    }

    #[test]
    fn test_hazard_pulses_on_interval() {
        let mut config = config();
        config.spawn.count = 0;
        config.hazard.interval = 2;
        config.hazard.radius = 40.0;
        let mut sim = Simulation::new(config);
        let inside = sim.world.add_body(glam::Vec2::new(360.0, 350.0), glam::Vec2::new(0.5, 0.0), 10.0);
        let outside = sim.world.add_body(glam::Vec2::new(100.0, 100.0), glam::Vec2::new(0.5, 0.0), 10.0);

        assert_eq!(sim.tick().repelled, 0);
        assert_eq!(sim.tick().repelled, 1);
        assert_eq!(sim.world.get_body(inside).unwrap().velocity, glam::Vec2::new(-0.5, 0.0));
        assert_eq!(sim.world.get_body(outside).unwrap().velocity, glam::Vec2::new(0.5, 0.0));

        assert_eq!(sim.tick().repelled, 0);
        assert_eq!(sim.tick().repelled, 1);
        assert_eq!(sim.world.get_body(inside).unwrap().velocity, glam::Vec2::new(0.5, 0.0));
    }

    #[tokio::test]
    async fn test_run_stops_after_configured_frames() {
        let mut config = config();
        config.simulation.tick_interval_ms = 1;
        config.simulation.frames = 3;
        run(config).await.unwrap();
    }
}
