//! The quadtree itself.
//!
//! Built fresh every frame over the arena, filled with borrowed entities,
//! queried once per entity and then dropped. There is no removal or
//! incremental update.

use crate::{InsertError, Locate, Rectangle};
use glam::Vec2;
use std::fmt;
use tracing::{debug, error};

/// Depth at which nodes stop subdividing when no explicit limit is given.
///
/// A leaf at this depth accepts points beyond capacity. Without the cap a
/// cluster of coincident points would subdivide forever.
pub const DEFAULT_MAX_DEPTH: u32 = 12;

/// Largest depth cap a tree accepts. Larger values are clamped.
pub const MAX_DEPTH_LIMIT: u32 = 64;

/// Exact node edges.
///
/// Children take their outer edges from the parent and share one computed
/// midline, so the four quadrants cover the parent with no gap even when the
/// halves are not representable.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extent {
    min: Vec2,
    max: Vec2,
}

impl Extent {
    fn of(rect: &Rectangle) -> Self {
        Self {
            min: Vec2::new(rect.x, rect.y),
            max: Vec2::new(rect.right(), rect.bottom()),
        }
    }

    #[inline]
    fn mid(&self) -> Vec2 {
        self.min * 0.5 + self.max * 0.5
    }

    #[inline]
    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }

    #[inline]
    fn intersects(&self, range: &Rectangle) -> bool {
        !(range.x > self.max.x || range.right() < self.min.x || range.y > self.max.y || range.bottom() < self.min.y)
    }

    /// False once neither axis has a midline strictly between its edges.
    fn can_split(&self) -> bool {
        let mid = self.mid();
        (mid.x > self.min.x && mid.x < self.max.x) || (mid.y > self.min.y && mid.y < self.max.y)
    }

    /// NW, NE, SW, SE.
    fn quadrants(&self) -> [Extent; 4] {
        let (min, max, mid) = (self.min, self.max, self.mid());
        [
            Extent { min, max: mid },
            Extent {
                min: Vec2::new(mid.x, min.y),
                max: Vec2::new(max.x, mid.y),
            },
            Extent {
                min: Vec2::new(min.x, mid.y),
                max: Vec2::new(mid.x, max.y),
            },
            Extent { min: mid, max },
        ]
    }

    /// Index of the quadrant a contained point belongs to. Points on a
    /// midline go west and north.
    #[inline]
    fn quadrant_of(&self, x: f32, y: f32) -> usize {
        let mid = self.mid();
        usize::from(x > mid.x) + 2 * usize::from(y > mid.y)
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::new(self.min.x, self.min.y, self.max.x - self.min.x, self.max.y - self.min.y)
    }
}

/// A single node of the tree.
///
/// A node is either a leaf holding up to `capacity` points (more at the depth
/// cap, or once its extent is too small to halve) or divided, in which case
/// it holds no points and owns exactly four children in NW, NE, SW, SE order.
#[derive(Debug)]
pub struct Node<'a, T> {
    boundary: Rectangle,
    extent: Extent,
    depth: u32,
    points: Vec<&'a T>,
    children: Option<Box<[Node<'a, T>; 4]>>,
}

/// Split-policy values shared by every node of one tree.
#[derive(Debug, Clone, Copy)]
struct Policy {
    capacity: usize,
    max_depth: u32,
}

impl<'a, T> Node<'a, T> {
    fn new(boundary: Rectangle, depth: u32) -> Self {
        Self::with_extent(boundary, Extent::of(&boundary), depth)
    }

    fn with_extent(boundary: Rectangle, extent: Extent, depth: u32) -> Self {
        Self {
            boundary,
            extent,
            depth,
            points: Vec::new(),
            children: None,
        }
    }

    /// The region this node is responsible for.
    #[inline]
    pub fn boundary(&self) -> Rectangle {
        self.boundary
    }

    /// Depth below the root (the root is 0).
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Points held directly by this node, in insertion order.
    #[inline]
    pub fn points(&self) -> &[&'a T] {
        &self.points
    }

    #[inline]
    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }

    /// The four quadrants (NW, NE, SW, SE) once divided.
    #[inline]
    pub fn children(&self) -> Option<&[Node<'a, T>; 4]> {
        self.children.as_deref()
    }

    fn collect_stats(&self, stats: &mut TreeStats, capacity: usize) {
        stats.nodes += 1;
        stats.max_depth_reached = stats.max_depth_reached.max(self.depth);
        match &self.children {
            Some(children) => {
                for child in children.iter() {
                    child.collect_stats(stats, capacity);
                }
            }
            None => {
                stats.leaves += 1;
                stats.items += self.points.len();
                if self.points.len() > capacity {
                    stats.overfull_leaves += 1;
                }
            }
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = self.depth as usize * 2;
        writeln!(f, "{:indent$}{} len={}", "", self.boundary, self.points.len())?;
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.write_tree(f)?;
            }
        }
        Ok(())
    }
}

impl<'a, T: Locate> Node<'a, T> {
    /// Insert a point this node is known to contain.
    ///
    /// Points lost while re-homing during a subdivision are added to `dropped`.
    fn insert(&mut self, item: &'a T, policy: Policy, dropped: &mut usize) -> Result<(), InsertError> {
        if self.children.is_none() {
            if self.points.len() < policy.capacity || self.depth >= policy.max_depth || !self.extent.can_split() {
                self.points.push(item);
                return Ok(());
            }
            self.subdivide(policy, dropped);
        }
        self.insert_into_child(item, policy, dropped)
    }

    /// Hand a point to the quadrant on its side of both midlines. Midline
    /// ties go to the west and north quadrants.
    fn insert_into_child(&mut self, item: &'a T, policy: Policy, dropped: &mut usize) -> Result<(), InsertError> {
        let (x, y) = (item.x(), item.y());
        let quadrant = self.extent.quadrant_of(x, y);
        let claimed = self
            .children
            .as_deref_mut()
            .map(|children| &mut children[quadrant])
            .filter(|child| child.extent.contains(x, y));

        match claimed {
            Some(child) => child.insert(item, policy, dropped),
            None => Err(InsertError::Unclaimed { x, y }),
        }
    }

    fn subdivide(&mut self, policy: Policy, dropped: &mut usize) {
        let depth = self.depth + 1;
        let quadrant = |extent: Extent| Node::with_extent(extent.to_rectangle(), extent, depth);
        let [nw, ne, sw, se] = self.extent.quadrants();
        self.children = Some(Box::new([quadrant(nw), quadrant(ne), quadrant(sw), quadrant(se)]));

        for item in std::mem::take(&mut self.points) {
            if let Err(e) = self.insert_into_child(item, policy, dropped) {
                error!("Subdividing {} lost a point: {}", self.boundary, e);
                *dropped += 1;
            }
        }
    }

    fn query(&self, range: &Rectangle, found: &mut Vec<&'a T>) {
        if !self.extent.intersects(range) {
            return;
        }

        found.extend(self.points.iter().copied().filter(|p| range.contains(*p)));

        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(range, found);
            }
        }
    }
}

/// Shape summary of a tree, used for frame diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub items: usize,
    pub max_depth_reached: u32,
    /// Leaves holding more than `capacity` points, either at the depth cap or
    /// too small to halve.
    pub overfull_leaves: usize,
}

/// Quadtree over borrowed points.
///
/// The tree stores `&'a T`; identity is reference identity, so two entities
/// at the same coordinates are still two distinct entries.
pub struct Quadtree<'a, T> {
    root: Node<'a, T>,
    capacity: usize,
    max_depth: u32,
    len: usize,
}

impl<'a, T> Quadtree<'a, T> {
    /// Create an empty tree with the default depth cap.
    pub fn new(boundary: Rectangle, capacity: usize) -> Self {
        Self::with_max_depth(boundary, capacity, DEFAULT_MAX_DEPTH)
    }

    /// Create an empty tree whose nodes stop subdividing at `max_depth`
    /// (at most [`MAX_DEPTH_LIMIT`]).
    pub fn with_max_depth(boundary: Rectangle, capacity: usize, max_depth: u32) -> Self {
        Self {
            root: Node::new(boundary, 0),
            capacity,
            max_depth: max_depth.min(MAX_DEPTH_LIMIT),
            len: 0,
        }
    }

    #[inline]
    pub fn boundary(&self) -> Rectangle {
        self.root.boundary
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Number of points currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn root(&self) -> &Node<'a, T> {
        &self.root
    }

    /// Walk the tree and summarize its shape.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        self.root.collect_stats(&mut stats, self.capacity);
        stats
    }

    /// Drop every point and child, leaving an empty leaf over the same
    /// boundary.
    pub fn clear(&mut self) {
        self.root = Node::with_extent(self.root.boundary, self.root.extent, 0);
        self.len = 0;
    }

    fn policy(&self) -> Policy {
        Policy {
            capacity: self.capacity,
            max_depth: self.max_depth,
        }
    }
}

impl<'a, T: Locate> Quadtree<'a, T> {
    /// Insert a point, reporting why it was rejected.
    pub fn try_insert(&mut self, item: &'a T) -> Result<(), InsertError> {
        if !self.root.extent.contains(item.x(), item.y()) {
            return Err(InsertError::OutOfBounds { x: item.x(), y: item.y() });
        }

        let policy = self.policy();
        let mut dropped = 0;
        let result = self.root.insert(item, policy, &mut dropped);
        if result.is_ok() {
            self.len += 1;
        }
        self.len -= dropped;
        result
    }

    /// Insert a point. Returns `false` if it was not stored.
    ///
    /// Points outside the boundary are logged at debug level. A point that no
    /// quadrant claims is a geometry bug and is logged as an error; the caller
    /// keeps running either way.
    pub fn insert(&mut self, item: &'a T) -> bool {
        match self.try_insert(item) {
            Ok(()) => true,
            Err(e @ InsertError::OutOfBounds { .. }) => {
                debug!("{} {}", e, self.root.boundary);
                false
            }
            Err(e @ InsertError::Unclaimed { .. }) => {
                error!("Quadtree insert failed: {}", e);
                false
            }
        }
    }

    /// Find every stored point inside `range`, in no particular order.
    pub fn query_range(&self, range: &Rectangle) -> Vec<&'a T> {
        let mut found = Vec::new();
        self.root.query(range, &mut found);
        found
    }

    /// Like [`Quadtree::query_range`], appending into a caller-owned buffer.
    #[inline]
    pub fn query_range_into(&self, range: &Rectangle, found: &mut Vec<&'a T>) {
        self.root.query(range, found);
    }
}

impl<T> fmt::Display for Quadtree<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.write_tree(f)
    }
}

impl<T> fmt::Debug for Quadtree<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quadtree")
            .field("items", &self.len)
            .field("boundary", &self.root.boundary)
            .field("capacity", &self.capacity)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
