//! Shared configuration for cloudpaint
//!
//! This crate provides the single source of truth for brush limits, stroke
//! stamping cadence, and annotation display settings. Values loaded from
//! user files are clamped into range rather than rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default brush radius in screen pixels
pub const DEFAULT_BRUSH_RADIUS_PX: f64 = 8.0;

/// Smallest brush radius in screen pixels
pub const MIN_BRUSH_RADIUS_PX: f64 = 1.0;

/// Largest brush radius in screen pixels
pub const MAX_BRUSH_RADIUS_PX: f64 = 200.0;

/// Default rendered point size (sprite diameter) in pixels
pub const DEFAULT_POINT_SIZE_PX: f64 = 6.0;

/// Smallest rendered point size in pixels
pub const MIN_POINT_SIZE_PX: f64 = 1.0;

/// Largest rendered point size in pixels
pub const MAX_POINT_SIZE_PX: f64 = 20.0;

/// Candidate query inflation over the estimated world radius.
///
/// Tuning only: the screen-space filter decides membership.
pub const DEFAULT_COVERAGE_INFLATION: f64 = 1.25;

/// Stamp spacing as a fraction of the brush radius
pub const DEFAULT_SPACING_FRACTION: f64 = 0.33;

/// Pixel distance within which a pick under the cursor counts as a hit
pub const DEFAULT_PICK_TOLERANCE_PX: f64 = 24.0;

/// Default number of strokes kept on the undo stack
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Errors raised while reading a configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Brush geometry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Initial brush radius in pixels
    pub radius_px: f64,
    /// Rendered point sprite diameter in pixels
    pub point_size_px: f64,
    /// Inflation applied to the world-space candidate radius
    pub coverage_inflation: f64,
    /// Pick tolerance in pixels for the reference picker
    pub pick_tolerance_px: f64,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius_px: DEFAULT_BRUSH_RADIUS_PX,
            point_size_px: DEFAULT_POINT_SIZE_PX,
            coverage_inflation: DEFAULT_COVERAGE_INFLATION,
            pick_tolerance_px: DEFAULT_PICK_TOLERANCE_PX,
        }
    }
}

/// Stroke stamping and history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    /// Distance between stamps as a fraction of brush radius
    pub spacing_fraction: f64,
    /// Maximum number of undo entries (oldest dropped first)
    pub history_limit: usize,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            spacing_fraction: DEFAULT_SPACING_FRACTION,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// How annotations are composed over the base colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Opacity of painted colors over the base, 0.0-1.0
    pub annotation_alpha: f64,
    /// Whether painted colors are shown at all
    pub annotations_visible: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            annotation_alpha: 1.0,
            annotations_visible: true,
        }
    }
}

/// Top-level annotator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub brush: BrushConfig,
    pub stroke: StrokeConfig,
    pub display: DisplayConfig,
}

impl AnnotatorConfig {
    /// Parse a JSON document, filling missing fields with defaults and
    /// clamping everything into range
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.clamped())
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Return a copy with every value forced into its valid range
    pub fn clamped(mut self) -> Self {
        self.brush.radius_px = clamp_or(
            self.brush.radius_px,
            MIN_BRUSH_RADIUS_PX,
            MAX_BRUSH_RADIUS_PX,
            DEFAULT_BRUSH_RADIUS_PX,
        );
        self.brush.point_size_px = clamp_or(
            self.brush.point_size_px,
            MIN_POINT_SIZE_PX,
            MAX_POINT_SIZE_PX,
            DEFAULT_POINT_SIZE_PX,
        );
        // Anything below 1.0 would under-select at the ring boundary
        self.brush.coverage_inflation =
            clamp_or(self.brush.coverage_inflation, 1.0, 4.0, DEFAULT_COVERAGE_INFLATION);
        self.brush.pick_tolerance_px =
            clamp_or(self.brush.pick_tolerance_px, 0.0, 1000.0, DEFAULT_PICK_TOLERANCE_PX);
        self.stroke.spacing_fraction =
            clamp_or(self.stroke.spacing_fraction, 0.01, 2.0, DEFAULT_SPACING_FRACTION);
        self.stroke.history_limit = self.stroke.history_limit.max(1);
        self.display.annotation_alpha = clamp_or(self.display.annotation_alpha, 0.0, 1.0, 1.0);
        self
    }
}

/// Clamp a value into `[min, max]`, replacing NaN with `fallback`
pub fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}
