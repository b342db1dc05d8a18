use glam::DVec2;
use serde::{Deserialize, Serialize};

/// An 8-bit RGB color triple, one per point.
///
/// Laid out as three packed bytes so color buffers can be handed to a
/// renderer or writer with `bytemuck::cast_slice`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
#[repr(C)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn from_channels(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }

    /// Alpha-blend `self` over `base`
    ///
    /// Rounds to nearest like the display compositor expects.
    pub fn blend_over(self, base: Self, alpha: f64) -> Self {
        let mix = |fg: u8, bg: u8| -> u8 {
            let v = alpha * f64::from(fg) + (1.0 - alpha) * f64::from(bg);
            v.round().clamp(0.0, 255.0) as u8
        };
        Self::new(mix(self.r, base.r), mix(self.g, base.g), mix(self.b, base.b))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::from_channels(c)
    }
}

/// What a stamp writes into the working colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tool {
    /// Write a label color and mark points painted
    Paint(Rgb),
    /// Restore original colors and clear the painted flag
    Erase,
}

impl Default for Tool {
    fn default() -> Self {
        Tool::Paint(Rgb::new(255, 0, 0))
    }
}

/// Which part of a rendered point has to fall inside the brush ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FootprintMode {
    /// Keep a point if its sprite overlaps the ring
    #[default]
    Overlap,
    /// Keep a point only if its whole sprite is inside the ring
    Contained,
}

/// Modifier keys relevant to painting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Constrain the stroke to a straight line from its anchor
    pub line_constraint: bool,
}

/// A pointer event delivered by the renderer, in screen pixels
/// (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: DVec2,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            modifiers: Modifiers::default(),
        }
    }

    /// Same event with the line constraint held
    pub fn with_line_constraint(mut self) -> Self {
        self.modifiers.line_constraint = true;
        self
    }
}
