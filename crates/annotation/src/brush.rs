//! Brush settings and stamp placement
//!
//! [`BrushSettings`] is the current brush (radius, rendered point size,
//! tool, footprint). [`StampPath`] turns a drag into discrete stamp
//! positions: freehand drags are interpolated so consecutive stamps are at
//! most one spacing apart, and line-constrained drags advance along a fixed
//! direction from the stroke anchor.

use cloudpaint_config::BrushConfig;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{CONTAINED_FALLBACK_PX, MAX_STAMPS_PER_MOVE, MIN_STAMP_SPACING_PX};
use crate::types::{FootprintMode, Tool};
use crate::validation::{clamp_brush_radius, clamp_point_size};

/// Current brush configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    radius_px: f64,
    point_size_px: f64,
    coverage_inflation: f64,
    /// What stamps write
    pub tool: Tool,
    /// Which part of a point has to be inside the ring
    pub footprint: FootprintMode,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self::from_config(&BrushConfig::default())
    }
}

impl BrushSettings {
    pub fn from_config(config: &BrushConfig) -> Self {
        Self {
            radius_px: clamp_brush_radius(config.radius_px),
            point_size_px: clamp_point_size(config.point_size_px),
            coverage_inflation: config.coverage_inflation.max(1.0),
            tool: Tool::default(),
            footprint: FootprintMode::default(),
        }
    }

    /// Brush radius in pixels (1-200)
    pub fn radius_px(&self) -> f64 {
        self.radius_px
    }

    pub fn set_radius_px(&mut self, radius_px: f64) {
        self.radius_px = clamp_brush_radius(radius_px);
    }

    /// Rendered point sprite diameter in pixels (1-20)
    pub fn point_size_px(&self) -> f64 {
        self.point_size_px
    }

    pub fn set_point_size_px(&mut self, size_px: f64) {
        self.point_size_px = clamp_point_size(size_px);
    }

    /// Half the rendered sprite size
    pub fn point_radius_px(&self) -> f64 {
        0.5 * self.point_size_px
    }

    pub fn coverage_inflation(&self) -> f64 {
        self.coverage_inflation
    }

    /// Largest screen distance from the brush center at which a point
    /// center is still selected
    pub fn reach_px(&self) -> f64 {
        let r = self.radius_px;
        let s = self.point_radius_px();
        match self.footprint {
            FootprintMode::Overlap => r + s,
            FootprintMode::Contained if r - s > CONTAINED_FALLBACK_PX => r - s,
            // Tiny brush under large points: nothing fits fully inside
            FootprintMode::Contained => r + s,
        }
    }

    /// Radius of the cursor ring the UI should draw
    pub fn ring_radius(&self) -> f64 {
        match self.footprint {
            FootprintMode::Overlap => self.radius_px,
            FootprintMode::Contained => (self.radius_px - self.point_radius_px()).max(1.0),
        }
    }
}

/// Line constraint state once its direction is fixed
#[derive(Debug, Clone, Copy)]
struct LineState {
    direction: DVec2,
    /// Distance along `direction` already stamped
    covered: f64,
}

/// Stamp placement along one drag
///
/// The path interpolates between pointer positions and places stamps
/// according to the spacing, like a dab spacer in a raster painter.
#[derive(Debug, Clone)]
pub struct StampPath {
    /// Spacing as a fraction of brush radius
    spacing_fraction: f64,
    /// Last stamped position (None if no stroke)
    last: Option<DVec2>,
    /// Pointer-down position
    anchor: Option<DVec2>,
    /// Whether the stroke is constrained to a line
    constrained: bool,
    line: Option<LineState>,
}

impl StampPath {
    pub fn new(spacing_fraction: f64) -> Self {
        Self {
            spacing_fraction: spacing_fraction.max(0.0),
            last: None,
            anchor: None,
            constrained: false,
            line: None,
        }
    }

    /// Distance between stamps for a brush of `radius_px`
    pub fn spacing_px(&self, radius_px: f64) -> f64 {
        (self.spacing_fraction * radius_px).max(MIN_STAMP_SPACING_PX)
    }

    /// Start a path at `position`; returns the first stamp
    pub fn begin(&mut self, position: DVec2, constrained: bool) -> Vec<DVec2> {
        self.end();
        if !position.is_finite() {
            return Vec::new();
        }
        self.anchor = Some(position);
        self.last = Some(position);
        self.constrained = constrained;
        vec![position]
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn is_constrained(&self) -> bool {
        self.constrained
    }

    /// Advance the path to `position` and return the stamps to apply
    pub fn stroke_to(&mut self, position: DVec2, radius_px: f64) -> Vec<DVec2> {
        if !position.is_finite() {
            return Vec::new();
        }
        let spacing = self.spacing_px(radius_px);

        let stamps = if self.constrained {
            self.line_to(position, spacing)
        } else {
            self.freehand_to(position, spacing)
        };

        if !stamps.is_empty() {
            debug!(
                "StampPath::stroke_to: {} stamps toward ({:.1}, {:.1}), spacing={:.2}",
                stamps.len(),
                position.x,
                position.y,
                spacing
            );
        }
        stamps
    }

    fn freehand_to(&mut self, position: DVec2, spacing: f64) -> Vec<DVec2> {
        let Some(last) = self.last else {
            return Vec::new();
        };

        let delta = position - last;
        let distance = delta.length();
        if distance < spacing {
            return Vec::new();
        }

        let steps = Self::step_count(distance, spacing);
        let stamps = (1..=steps)
            .map(|i| last + delta * (i as f64 / steps as f64))
            .collect();
        self.last = Some(position);
        stamps
    }

    fn line_to(&mut self, position: DVec2, spacing: f64) -> Vec<DVec2> {
        let Some(anchor) = self.anchor else {
            return Vec::new();
        };

        let line = match self.line {
            Some(line) => line,
            None => {
                // Direction is fixed by the first move that clears the spacing
                let offset = position - anchor;
                if offset.length() < spacing {
                    return Vec::new();
                }
                let line = LineState {
                    direction: offset.normalize(),
                    covered: 0.0,
                };
                self.line = Some(line);
                line
            }
        };

        let along = (position - anchor).dot(line.direction);
        let advance = along - line.covered;
        if advance < spacing {
            return Vec::new();
        }

        let steps = Self::step_count(advance, spacing);
        let stamps: Vec<DVec2> = (1..=steps)
            .map(|i| anchor + line.direction * (line.covered + advance * (i as f64 / steps as f64)))
            .collect();

        self.line = Some(LineState {
            covered: along,
            ..line
        });
        self.last = stamps.last().copied();
        stamps
    }

    fn step_count(distance: f64, spacing: f64) -> usize {
        let steps = (distance / spacing).ceil().max(1.0);
        if steps > MAX_STAMPS_PER_MOVE as f64 {
            warn!(
                "StampPath: {:.0} stamps requested, capped at {}; stamps will leave gaps",
                steps, MAX_STAMPS_PER_MOVE
            );
            MAX_STAMPS_PER_MOVE
        } else {
            steps as usize
        }
    }

    /// End the current path
    pub fn end(&mut self) {
        self.last = None;
        self.anchor = None;
        self.constrained = false;
        self.line = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brush_settings_default() {
        let brush = BrushSettings::default();
        assert_eq!(brush.radius_px(), 8.0);
        assert_eq!(brush.point_size_px(), 6.0);
        assert_eq!(brush.footprint, FootprintMode::Overlap);
    }

    #[test]
    fn test_brush_settings_clamp() {
        let mut brush = BrushSettings::default();
        brush.set_radius_px(0.0);
        assert_eq!(brush.radius_px(), 1.0);
        brush.set_radius_px(1000.0);
        assert_eq!(brush.radius_px(), 200.0);
        brush.set_point_size_px(50.0);
        assert_eq!(brush.point_size_px(), 20.0);
    }

    #[test]
    fn test_reach_by_footprint() {
        let mut brush = BrushSettings::default();
        brush.set_radius_px(10.0);
        brush.set_point_size_px(4.0);
        assert!((brush.reach_px() - 12.0).abs() < 1e-12);

        brush.footprint = FootprintMode::Contained;
        assert!((brush.reach_px() - 8.0).abs() < 1e-12);
        assert!((brush.ring_radius() - 8.0).abs() < 1e-12);

        // Sprite larger than the brush: fall back to overlap
        brush.set_radius_px(2.0);
        brush.set_point_size_px(6.0);
        assert!((brush.reach_px() - 5.0).abs() < 1e-12);
        assert!((brush.ring_radius() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_first_stamp_at_begin() {
        let mut path = StampPath::new(0.5);
        let stamps = path.begin(DVec2::new(100.0, 100.0), false);
        assert_eq!(stamps, vec![DVec2::new(100.0, 100.0)]);
        assert!(path.is_active());
    }

    #[test]
    fn test_no_stamp_for_small_movement() {
        // spacing = 0.5 * 20 = 10 px
        let mut path = StampPath::new(0.5);
        path.begin(DVec2::ZERO, false);
        assert!(path.stroke_to(DVec2::new(5.0, 0.0), 20.0).is_empty());
        // Distance is measured from the last stamp, not the last event
        let stamps = path.stroke_to(DVec2::new(10.0, 0.0), 20.0);
        assert_eq!(stamps, vec![DVec2::new(10.0, 0.0)]);
    }

    #[test]
    fn test_fast_drag_is_interpolated() {
        let mut path = StampPath::new(0.5);
        path.begin(DVec2::ZERO, false);
        let stamps = path.stroke_to(DVec2::new(50.0, 0.0), 20.0);
        assert_eq!(stamps.len(), 5);
        for pair in stamps.windows(2) {
            assert!(pair[0].distance(pair[1]) <= 10.0 + 1e-9);
        }
        assert_eq!(*stamps.last().expect("stamps"), DVec2::new(50.0, 0.0));
    }

    #[test]
    fn test_long_drag_keeps_spacing() {
        // A small brush dragged across a wide screen
        let mut path = StampPath::new(0.33);
        path.begin(DVec2::ZERO, false);
        let stamps = path.stroke_to(DVec2::new(3000.0, 0.0), 1.0);
        assert_eq!(stamps.len(), 3000);
        for pair in stamps.windows(2) {
            assert!(pair[0].distance(pair[1]) <= MIN_STAMP_SPACING_PX + 1e-9);
        }
    }

    #[test]
    fn test_stamps_per_move_are_capped() {
        let mut path = StampPath::new(0.33);
        path.begin(DVec2::ZERO, false);
        let stamps = path.stroke_to(DVec2::new(1.0e6, 0.0), 1.0);
        assert_eq!(stamps.len(), MAX_STAMPS_PER_MOVE);
        assert_eq!(*stamps.last().expect("stamps"), DVec2::new(1.0e6, 0.0));
    }

    #[test]
    fn test_spacing_never_below_one_pixel() {
        let path = StampPath::new(0.33);
        assert_eq!(path.spacing_px(1.0), MIN_STAMP_SPACING_PX);
        assert!((path.spacing_px(30.0) - 9.9).abs() < 1e-9);
    }

    #[test]
    fn test_line_constraint_projects_onto_line() {
        let mut path = StampPath::new(0.5);
        path.begin(DVec2::ZERO, true);

        // First move fixes the direction along +x
        let stamps = path.stroke_to(DVec2::new(20.0, 0.0), 20.0);
        assert_eq!(stamps.len(), 2);

        // Wandering off the line still stamps on it
        let stamps = path.stroke_to(DVec2::new(40.0, 15.0), 20.0);
        assert_eq!(stamps.len(), 2);
        for s in &stamps {
            assert!(s.y.abs() < 1e-9);
        }
        assert!((stamps[1].x - 40.0).abs() < 1e-9);

        // Moving back along the line stamps nothing new
        assert!(path.stroke_to(DVec2::new(30.0, 0.0), 20.0).is_empty());
    }

    #[test]
    fn test_line_waits_for_direction() {
        let mut path = StampPath::new(0.5);
        path.begin(DVec2::ZERO, true);
        assert!(path.stroke_to(DVec2::new(3.0, 3.0), 20.0).is_empty());
        assert!(path.is_constrained());
    }

    #[test]
    fn test_end_resets() {
        let mut path = StampPath::new(0.5);
        path.begin(DVec2::ZERO, true);
        path.stroke_to(DVec2::new(50.0, 0.0), 20.0);
        path.end();
        assert!(!path.is_active());
        assert!(path.stroke_to(DVec2::new(80.0, 0.0), 20.0).is_empty());
    }

    #[test]
    fn test_non_finite_positions_ignored() {
        let mut path = StampPath::new(0.5);
        assert!(path.begin(DVec2::new(f64::NAN, 0.0), false).is_empty());
        path.begin(DVec2::ZERO, false);
        assert!(path.stroke_to(DVec2::new(f64::INFINITY, 0.0), 20.0).is_empty());
    }
}
