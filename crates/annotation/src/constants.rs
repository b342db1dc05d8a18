/// Smallest distance between two stamps, in pixels.
pub const MIN_STAMP_SPACING_PX: f64 = 1.0;

/// Upper bound on stamps generated by a single pointer move.
pub const MAX_STAMPS_PER_MOVE: usize = 4096;

/// Below this inner radius the contained footprint falls back to overlap.
pub const CONTAINED_FALLBACK_PX: f64 = 0.5;

/// Floor for the world-space candidate radius.
pub const MIN_WORLD_RADIUS: f64 = 1e-9;

/// Denominator guard for contrast stretching (normalized 0-1 units).
pub const STRETCH_EPSILON: f64 = 1e-5;

/// Gamma bounds for enhancement.
pub const MIN_GAMMA: f64 = 0.1;
pub const MAX_GAMMA: f64 = 10.0;

/// Default auto-contrast percentiles.
pub const DEFAULT_PERCENTILE_LOW: f64 = 2.0;
pub const DEFAULT_PERCENTILE_HIGH: f64 = 98.0;

/// Gamma slider position that maps to gamma 1.0.
pub const GAMMA_SLIDER_NEUTRAL: f64 = 100.0;

/// Slider units per doubling of gamma.
pub const GAMMA_SLIDER_OCTAVE: f64 = 50.0;

/// Maximum points stored in a k-d tree leaf.
pub const KD_LEAF_SIZE: usize = 16;

/// Points picked around the brush ring to estimate the world radius.
pub const EDGE_SAMPLE_COUNT: usize = 8;

/// Cap on the ring-edge radius estimate, as a multiple of the pixel-scale estimate.
pub const EDGE_RADIUS_MAX_STRETCH: f64 = 8.0;

/// Kept points beyond this fraction of the query radius trigger a wider query.
pub const SELECTION_SHELL_FRACTION: f64 = 0.9;

/// Maximum number of query radius doublings per selection.
pub const MAX_SELECTION_GROWTH: usize = 6;

/// Squared sine below which a camera's up vector counts as parallel to its view direction.
pub const UP_PARALLEL_EPSILON: f64 = 1e-12;
