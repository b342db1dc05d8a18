//! Renderer contract for brush selection.
//!
//! The annotation core never renders. It only needs a renderer to:
//! - project a world point to a screen pixel (with its depth)
//! - pick the world point under a pixel
//! - report how many pixels one world unit covers at a given depth
//!
//! [`ProjectionAdapter`] is that contract. [`PinholeView`] is a reference
//! implementation over a perspective look-at camera, used by tests and by
//! headless tooling.

use glam::{DMat4, DVec2, DVec3};

use crate::constants::UP_PARALLEL_EPSILON;

/// A world point after projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Pixel position, origin top-left, y down
    pub pixel: DVec2,
    /// Distance along the view direction (positive in front of the camera)
    pub depth: f64,
}

/// What the annotation core needs from whatever renderer is plugged in.
pub trait ProjectionAdapter {
    /// Project a world point to screen space.
    ///
    /// Returns `None` for points that cannot be seen (e.g. behind the camera).
    fn project_to_screen(&self, point: DVec3) -> Option<ScreenPoint>;

    /// World position of the rendered point nearest to `pixel`, or `None`
    /// when nothing is rendered close enough.
    fn pick_nearest(&self, pixel: DVec2) -> Option<DVec3>;

    /// On-screen pixels covered by one world unit at `depth`.
    fn pixels_per_world_unit(&self, depth: f64) -> f64;

    /// Whether `pixel` lies inside the rendered viewport.
    fn viewport_contains(&self, _pixel: DVec2) -> bool {
        true
    }
}

/// A perspective look-at camera with a pixel viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct PinholeCamera {
    /// Camera position
    pub eye: DVec3,
    /// Point the camera looks at
    pub target: DVec3,
    /// Up direction (need not be orthogonal to the view direction)
    pub up: DVec3,
    /// Vertical field of view in radians
    pub fov_y: f64,
    /// Viewport size in pixels (width, height)
    pub viewport: DVec2,
    /// Points closer than this are not projected
    pub near: f64,
}

impl PinholeCamera {
    pub fn new(eye: DVec3, target: DVec3, viewport: DVec2) -> Self {
        Self {
            eye,
            target,
            up: DVec3::Y,
            fov_y: 45f64.to_radians(),
            viewport,
            near: 1e-3,
        }
    }

    pub fn with_fov_y(mut self, fov_y: f64) -> Self {
        self.fov_y = fov_y;
        self
    }

    pub fn with_up(mut self, up: DVec3) -> Self {
        self.up = up;
        self
    }

    /// World-to-camera transform (camera looks down -Z).
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye, self.target, self.effective_up())
    }

    /// `up`, or the first world axis not parallel to the view direction when
    /// `up` is degenerate.
    fn effective_up(&self) -> DVec3 {
        let forward = (self.target - self.eye).normalize_or_zero();
        [self.up.normalize_or_zero(), DVec3::Y, DVec3::Z, DVec3::X]
            .into_iter()
            .find(|axis| forward.cross(*axis).length_squared() > UP_PARALLEL_EPSILON)
            .unwrap_or(DVec3::Y)
    }

    /// Focal length in pixels for the vertical field of view.
    pub fn focal_px(&self) -> f64 {
        (self.viewport.y * 0.5) / (self.fov_y * 0.5).tan()
    }

    pub fn project(&self, point: DVec3) -> Option<ScreenPoint> {
        let cam = self.view_matrix().transform_point3(point);
        let depth = -cam.z;
        if !cam.is_finite() || depth <= self.near {
            return None;
        }

        let f = self.focal_px();
        let pixel = DVec2::new(
            self.viewport.x * 0.5 + f * cam.x / depth,
            self.viewport.y * 0.5 - f * cam.y / depth,
        );
        Some(ScreenPoint { pixel, depth })
    }

    /// World point that projects to `pixel` at `depth`.
    pub fn unproject(&self, pixel: DVec2, depth: f64) -> DVec3 {
        let f = self.focal_px();
        let cam = DVec3::new(
            (pixel.x - self.viewport.x * 0.5) * depth / f,
            (self.viewport.y * 0.5 - pixel.y) * depth / f,
            -depth,
        );
        self.view_matrix().inverse().transform_point3(cam)
    }

    pub fn pixels_per_world_unit(&self, depth: f64) -> f64 {
        if depth > 0.0 {
            self.focal_px() / depth
        } else {
            0.0
        }
    }

    pub fn contains(&self, pixel: DVec2) -> bool {
        pixel.x >= 0.0 && pixel.y >= 0.0 && pixel.x <= self.viewport.x && pixel.y <= self.viewport.y
    }
}

/// Reference adapter: a pinhole camera looking at a fixed set of points.
///
/// Picking is a brute-force scan for the point whose projection is nearest
/// the cursor, within `pick_tolerance_px`; ties go to the point closer to
/// the camera.
#[derive(Debug, Clone)]
pub struct PinholeView {
    pub camera: PinholeCamera,
    positions: Vec<DVec3>,
    pick_tolerance_px: f64,
}

impl PinholeView {
    pub fn new(camera: PinholeCamera, positions: Vec<DVec3>, pick_tolerance_px: f64) -> Self {
        Self {
            camera,
            positions,
            pick_tolerance_px: pick_tolerance_px.max(0.0),
        }
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }
}

impl ProjectionAdapter for PinholeView {
    fn project_to_screen(&self, point: DVec3) -> Option<ScreenPoint> {
        self.camera.project(point)
    }

    fn pick_nearest(&self, pixel: DVec2) -> Option<DVec3> {
        let tol_sq = self.pick_tolerance_px * self.pick_tolerance_px;
        let mut best: Option<(f64, f64, DVec3)> = None;

        for &position in &self.positions {
            let Some(sp) = self.camera.project(position) else {
                continue;
            };
            let d_sq = sp.pixel.distance_squared(pixel);
            if d_sq > tol_sq {
                continue;
            }
            let better = match best {
                Some((best_sq, best_depth, _)) => {
                    d_sq < best_sq || (d_sq == best_sq && sp.depth < best_depth)
                }
                None => true,
            };
            if better {
                best = Some((d_sq, sp.depth, position));
            }
        }

        best.map(|(_, _, position)| position)
    }

    fn pixels_per_world_unit(&self, depth: f64) -> f64 {
        self.camera.pixels_per_world_unit(depth)
    }

    fn viewport_contains(&self, pixel: DVec2) -> bool {
        self.camera.contains(pixel)
    }
}
