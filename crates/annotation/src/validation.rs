//! Clamping helpers for user-supplied parameters.
//!
//! Out-of-range values are pulled into range, never rejected.

use cloudpaint_config::{
    MAX_BRUSH_RADIUS_PX, MAX_POINT_SIZE_PX, MIN_BRUSH_RADIUS_PX, MIN_POINT_SIZE_PX, clamp_or,
};

use crate::constants::{
    DEFAULT_PERCENTILE_HIGH, DEFAULT_PERCENTILE_LOW, GAMMA_SLIDER_NEUTRAL, GAMMA_SLIDER_OCTAVE,
    MAX_GAMMA, MIN_GAMMA,
};

/// Clamp a brush radius to 1-200 pixels
pub fn clamp_brush_radius(radius_px: f64) -> f64 {
    clamp_or(radius_px, MIN_BRUSH_RADIUS_PX, MAX_BRUSH_RADIUS_PX, MIN_BRUSH_RADIUS_PX)
}

/// Clamp a rendered point size to 1-20 pixels
pub fn clamp_point_size(size_px: f64) -> f64 {
    clamp_or(size_px, MIN_POINT_SIZE_PX, MAX_POINT_SIZE_PX, MIN_POINT_SIZE_PX)
}

/// Clamp a gamma exponent; NaN becomes the identity curve
pub fn clamp_gamma(gamma: f64) -> f64 {
    clamp_or(gamma, MIN_GAMMA, MAX_GAMMA, 1.0)
}

/// Clamp an annotation opacity to 0-1; NaN becomes opaque
pub fn clamp_alpha(alpha: f64) -> f64 {
    clamp_or(alpha, 0.0, 1.0, 1.0)
}

/// Clamp a percentile pair into 0-100 with `low <= high`
pub fn clamp_percentiles(low: f64, high: f64) -> (f64, f64) {
    let low = clamp_or(low, 0.0, 100.0, DEFAULT_PERCENTILE_LOW);
    let high = clamp_or(high, 0.0, 100.0, DEFAULT_PERCENTILE_HIGH);
    if low <= high { (low, high) } else { (high, low) }
}

/// Map a gamma slider position to a gamma exponent.
///
/// Position 100 is gamma 1.0 and every 50 units doubles or halves it.
pub fn gamma_from_slider(position: f64) -> f64 {
    clamp_gamma(2f64.powf((position - GAMMA_SLIDER_NEUTRAL) / GAMMA_SLIDER_OCTAVE))
}
