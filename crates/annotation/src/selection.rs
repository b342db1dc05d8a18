//! Screen-space brush selection.
//!
//! Selection runs in two phases:
//! 1. A world-space radius query around the point under the cursor gathers a
//!    superset of candidates. The radius is the larger of the pixel-scale
//!    estimate at the picked depth and the distance to the points picked
//!    under the ring's edge, then inflated.
//! 2. Every candidate is projected and kept only if its sprite passes the
//!    brush footprint test in screen space.
//!
//! If a kept candidate lies in the outer shell of the query sphere, the
//! surface may continue past it (steep viewing angles), so the query is
//! repeated with a doubled radius.

use glam::{DVec2, DVec3};
use tracing::debug;

use crate::brush::BrushSettings;
use crate::constants::{
    EDGE_RADIUS_MAX_STRETCH, EDGE_SAMPLE_COUNT, MAX_SELECTION_GROWTH, MIN_WORLD_RADIUS,
    SELECTION_SHELL_FRACTION,
};
use crate::projection::ProjectionAdapter;
use crate::spatial::KdTree;

/// Brush selection over one loaded cloud
#[derive(Debug, Clone, Copy)]
pub struct BrushSelector<'a> {
    index: &'a KdTree,
    positions: &'a [DVec3],
}

impl<'a> BrushSelector<'a> {
    /// `index` must have been built from `positions`
    pub fn new(index: &'a KdTree, positions: &'a [DVec3]) -> Self {
        Self { index, positions }
    }

    /// Indices of the points under a brush centered at `center` (pixels).
    ///
    /// Returns sorted, deduplicated indices. Empty when the center is
    /// outside the viewport or nothing is under the cursor.
    pub fn select<A: ProjectionAdapter + ?Sized>(
        &self,
        adapter: &A,
        center: DVec2,
        brush: &BrushSettings,
    ) -> Vec<usize> {
        if self.positions.is_empty() || !center.is_finite() || !adapter.viewport_contains(center) {
            return Vec::new();
        }

        let Some(picked) = adapter.pick_nearest(center) else {
            return Vec::new();
        };
        let Some(picked_screen) = adapter.project_to_screen(picked) else {
            return Vec::new();
        };

        let ppu = adapter.pixels_per_world_unit(picked_screen.depth);
        if !ppu.is_finite() || ppu <= 0.0 {
            debug!("BrushSelector: invalid pixel scale {} at depth {}", ppu, picked_screen.depth);
            return Vec::new();
        }

        let reach_px = brush.reach_px();
        let scale_radius = (brush.radius_px() + brush.point_radius_px()) / ppu;
        let edge_radius = Self::edge_radius(adapter, center, picked, reach_px)
            .min(scale_radius * EDGE_RADIUS_MAX_STRETCH);
        let mut world_radius =
            (scale_radius.max(edge_radius) * brush.coverage_inflation()).max(MIN_WORLD_RADIUS);

        let reach_sq = reach_px * reach_px;
        let mut growth = 0;
        loop {
            let candidates = self.index.query_radius(picked, world_radius);
            let mut farthest = 0.0f64;
            let selected: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&i| {
                    let Some(&position) = self.positions.get(i) else {
                        return false;
                    };
                    let keep = adapter
                        .project_to_screen(position)
                        .is_some_and(|sp| sp.pixel.distance_squared(center) <= reach_sq);
                    if keep {
                        farthest = farthest.max(position.distance(picked));
                    }
                    keep
                })
                .collect();

            let exhausted = candidates.len() >= self.index.len();
            if farthest <= world_radius * SELECTION_SHELL_FRACTION
                || exhausted
                || growth >= MAX_SELECTION_GROWTH
            {
                debug!(
                    "BrushSelector::select: center=({:.1}, {:.1}), world_radius={:.4}, {} candidates, {} selected",
                    center.x,
                    center.y,
                    world_radius,
                    candidates.len(),
                    selected.len()
                );
                return selected;
            }

            debug!(
                "BrushSelector: kept point at {:.4} of {:.4}, doubling query radius",
                farthest, world_radius
            );
            world_radius *= 2.0;
            growth += 1;
        }
    }

    /// Largest world distance from `picked` to the points under the ring's
    /// edge, sampled around the circle
    fn edge_radius<A: ProjectionAdapter + ?Sized>(
        adapter: &A,
        center: DVec2,
        picked: DVec3,
        reach_px: f64,
    ) -> f64 {
        (0..EDGE_SAMPLE_COUNT)
            .filter_map(|k| {
                let angle = std::f64::consts::TAU * k as f64 / EDGE_SAMPLE_COUNT as f64;
                let edge = center + DVec2::from_angle(angle) * reach_px;
                adapter.pick_nearest(edge)
            })
            .map(|p| p.distance(picked))
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max)
    }
}
