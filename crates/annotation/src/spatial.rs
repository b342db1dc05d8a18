//! Spatial index for brush candidate queries.
//!
//! A balanced k-d tree built once per loaded cloud:
//! - Median splits on the widest axis, O(N log N) build
//! - Radius queries for the brush candidate set
//! - Nearest-point lookup
//!
//! The tree is immutable after construction. A new cloud gets a new tree.

use std::thread::JoinHandle;

use glam::DVec3;
use tracing::{debug, info};

use crate::constants::KD_LEAF_SIZE;
use crate::error::AnnotationError;

/// Configuration for k-d tree construction.
#[derive(Debug, Clone)]
pub struct KdTreeConfig {
    /// Maximum points per leaf before splitting.
    pub max_items_per_leaf: usize,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        Self {
            max_items_per_leaf: KD_LEAF_SIZE,
        }
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::MAX),
            max: DVec3::splat(f64::MIN),
        }
    }

    pub fn include_point(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Squared distance from `point` to the closest point of the box
    /// (zero inside).
    pub fn distance_squared_to(&self, point: DVec3) -> f64 {
        let closest = point.max(self.min).min(self.max);
        closest.distance_squared(point)
    }

    /// Index of the axis with the largest extent.
    fn widest_axis(&self) -> usize {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }
}

/// A point stored in the tree: cloud index and position.
#[derive(Debug, Clone, Copy)]
struct KdItem {
    index: usize,
    position: DVec3,
}

/// A node in the tree (either split or leaf).
#[derive(Debug)]
enum KdNode {
    Leaf {
        bounds: Aabb,
        items: Vec<KdItem>,
    },
    Split {
        bounds: Aabb,
        left: Box<KdNode>,
        right: Box<KdNode>,
    },
}

impl KdNode {
    fn bounds(&self) -> &Aabb {
        match self {
            KdNode::Leaf { bounds, .. } | KdNode::Split { bounds, .. } => bounds,
        }
    }
}

/// Balanced k-d tree over point positions.
#[derive(Debug)]
pub struct KdTree {
    root: Option<KdNode>,
    len: usize,
    skipped: usize,
}

impl KdTree {
    /// Build a tree over `positions`; the returned indices refer to this slice.
    pub fn build(positions: &[DVec3]) -> Self {
        Self::build_with_config(positions, &KdTreeConfig::default())
    }

    pub fn build_with_config(positions: &[DVec3], config: &KdTreeConfig) -> Self {
        // Non-finite positions can never be hit by a query
        let mut items: Vec<KdItem> = positions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_finite())
            .map(|(index, &position)| KdItem { index, position })
            .collect();
        let skipped = positions.len() - items.len();
        if skipped > 0 {
            debug!("KdTree::build: skipped {} non-finite positions", skipped);
        }

        let len = items.len();
        let leaf_size = config.max_items_per_leaf.max(1);
        let root = if items.is_empty() {
            None
        } else {
            Some(Self::build_node(&mut items, leaf_size))
        };

        Self { root, len, skipped }
    }

    fn build_node(items: &mut [KdItem], leaf_size: usize) -> KdNode {
        let mut bounds = Aabb::empty();
        for item in items.iter() {
            bounds.include_point(item.position);
        }

        let axis = bounds.widest_axis();
        // All points coincide along every axis: nothing left to split
        if items.len() <= leaf_size || bounds.size()[axis] <= 0.0 {
            return KdNode::Leaf {
                bounds,
                items: items.to_vec(),
            };
        }

        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |a, b| a.position[axis].total_cmp(&b.position[axis]));
        let (lower, upper) = items.split_at_mut(mid);

        KdNode::Split {
            bounds,
            left: Box::new(Self::build_node(lower, leaf_size)),
            right: Box::new(Self::build_node(upper, leaf_size)),
        }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of input positions left out because they were not finite.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Bounds of every indexed point, if any.
    pub fn bounds(&self) -> Option<Aabb> {
        self.root.as_ref().map(|root| *root.bounds())
    }

    /// All indices within `radius` of `center`, sorted ascending.
    ///
    /// A zero radius returns only coincident points; a negative or
    /// non-finite radius returns nothing.
    pub fn query_radius(&self, center: DVec3, radius: f64) -> Vec<usize> {
        let mut results = Vec::new();
        if radius < 0.0 || !radius.is_finite() || !center.is_finite() {
            return results;
        }
        if let Some(root) = &self.root {
            Self::query_radius_node(root, center, radius * radius, &mut results);
        }
        results.sort_unstable();
        results
    }

    fn query_radius_node(node: &KdNode, center: DVec3, radius_sq: f64, results: &mut Vec<usize>) {
        if node.bounds().distance_squared_to(center) > radius_sq {
            return;
        }

        match node {
            KdNode::Leaf { items, .. } => {
                for item in items {
                    if item.position.distance_squared(center) <= radius_sq {
                        results.push(item.index);
                    }
                }
            }
            KdNode::Split { left, right, .. } => {
                Self::query_radius_node(left, center, radius_sq, results);
                Self::query_radius_node(right, center, radius_sq, results);
            }
        }
    }

    /// Index of the point closest to `center`.
    pub fn nearest(&self, center: DVec3) -> Option<usize> {
        if !center.is_finite() {
            return None;
        }
        let root = self.root.as_ref()?;
        let mut best: Option<(usize, f64)> = None;
        Self::nearest_node(root, center, &mut best);
        best.map(|(index, _)| index)
    }

    fn nearest_node(node: &KdNode, center: DVec3, best: &mut Option<(usize, f64)>) {
        if let Some((_, best_sq)) = *best {
            if node.bounds().distance_squared_to(center) > best_sq {
                return;
            }
        }

        match node {
            KdNode::Leaf { items, .. } => {
                for item in items {
                    let d = item.position.distance_squared(center);
                    let better = match *best {
                        Some((index, best_sq)) => d < best_sq || (d == best_sq && item.index < index),
                        None => true,
                    };
                    if better {
                        *best = Some((item.index, d));
                    }
                }
            }
            KdNode::Split { left, right, .. } => {
                // Visit the closer child first so the far one is usually pruned
                let dl = left.bounds().distance_squared_to(center);
                let dr = right.bounds().distance_squared_to(center);
                let (first, second) = if dl <= dr { (left, right) } else { (right, left) };
                Self::nearest_node(first, center, best);
                Self::nearest_node(second, center, best);
            }
        }
    }
}

/// A k-d tree being built on a worker thread.
///
/// Paint input stays blocked until [`PendingIndex::try_take`] yields the
/// finished tree.
#[derive(Debug)]
pub struct PendingIndex {
    handle: Option<JoinHandle<KdTree>>,
}

impl PendingIndex {
    /// Start building a tree over `positions` in the background.
    pub fn spawn(positions: Vec<DVec3>) -> Self {
        let handle = std::thread::spawn(move || {
            let tree = KdTree::build(&positions);
            info!("Background spatial index ready ({} points)", tree.len());
            tree
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Whether the worker has finished (successfully or not).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Take the finished tree without blocking.
    ///
    /// Returns `Ok(None)` while the build is still running.
    pub fn try_take(&mut self) -> Result<Option<KdTree>, AnnotationError> {
        if !self.is_finished() {
            return Ok(None);
        }
        self.wait().map(Some)
    }

    /// Block until the tree is built.
    pub fn wait(&mut self) -> Result<KdTree, AnnotationError> {
        let handle = self.handle.take().ok_or(AnnotationError::IndexBuildFailed)?;
        handle.join().map_err(|_| AnnotationError::IndexBuildFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(positions: &[DVec3], center: DVec3, radius: f64) -> Vec<usize> {
        positions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.distance_squared(center) <= radius * radius)
            .map(|(i, _)| i)
            .collect()
    }

    fn lattice(n: usize) -> Vec<DVec3> {
        let mut positions = Vec::new();
        for x in 0..n {
            for y in 0..n {
                for z in 0..n {
                    positions.push(DVec3::new(x as f64, y as f64 * 0.5, z as f64 * 2.0));
                }
            }
        }
        positions
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::build(&[]);
        assert!(tree.is_empty());
        assert!(tree.query_radius(DVec3::ZERO, 10.0).is_empty());
        assert_eq!(tree.nearest(DVec3::ZERO), None);
        assert!(tree.bounds().is_none());
    }

    #[test]
    fn test_query_matches_brute_force() {
        let positions = lattice(9);
        let tree = KdTree::build(&positions);
        assert_eq!(tree.len(), positions.len());

        for (center, radius) in [
            (DVec3::new(4.0, 2.0, 8.0), 1.5),
            (DVec3::new(0.0, 0.0, 0.0), 3.0),
            (DVec3::new(8.5, 4.2, 16.1), 2.2),
            (DVec3::new(-10.0, 0.0, 0.0), 1.0),
        ] {
            assert_eq!(
                tree.query_radius(center, radius),
                brute_force(&positions, center, radius)
            );
        }
    }

    #[test]
    fn test_zero_radius_returns_coincident_points() {
        let positions = vec![
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(2.0, 2.0, 2.0),
            DVec3::new(1.0, 1.0, 1.0),
        ];
        let tree = KdTree::build(&positions);
        assert_eq!(tree.query_radius(DVec3::ONE, 0.0), vec![0, 2]);
    }

    #[test]
    fn test_invalid_radius_returns_nothing() {
        let tree = KdTree::build(&lattice(3));
        assert!(tree.query_radius(DVec3::ZERO, -1.0).is_empty());
        assert!(tree.query_radius(DVec3::ZERO, f64::NAN).is_empty());
        assert!(tree.query_radius(DVec3::ZERO, f64::INFINITY).is_empty());
    }

    #[test]
    fn test_all_coincident_points() {
        let positions = vec![DVec3::splat(3.0); 100];
        let tree = KdTree::build(&positions);
        assert_eq!(tree.query_radius(DVec3::splat(3.0), 0.1).len(), 100);
    }

    #[test]
    fn test_non_finite_positions_are_skipped() {
        let positions = vec![
            DVec3::ZERO,
            DVec3::new(f64::NAN, 0.0, 0.0),
            DVec3::new(0.5, 0.0, 0.0),
        ];
        let tree = KdTree::build(&positions);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.skipped(), 1);
        assert_eq!(tree.query_radius(DVec3::ZERO, 1.0), vec![0, 2]);
    }

    #[test]
    fn test_nearest() {
        let positions = lattice(6);
        let tree = KdTree::build(&positions);
        let target = DVec3::new(2.1, 1.4, 5.9);
        let expected = positions
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.distance(target).total_cmp(&b.1.distance(target)))
            .map(|(i, _)| i);
        assert_eq!(tree.nearest(target), expected);
    }

    #[test]
    fn test_pending_index() {
        let positions = lattice(5);
        let mut pending = PendingIndex::spawn(positions.clone());
        let tree = pending.wait().expect("build succeeds");
        assert_eq!(tree.len(), positions.len());

        // A second take has nothing left to hand out
        assert_eq!(pending.wait().unwrap_err(), AnnotationError::IndexBuildFailed);
    }
}
