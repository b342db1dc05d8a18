//! Annotation state for one loaded cloud
//!
//! [`AnnotationState`] is the only writer of the color streams:
//! - `original`: baseline colors, never modified
//! - `working`: live labels, what gets displayed and saved
//! - `enhanced`: gamma/contrast transform of `original`
//! - `painted`: per-point flag set by brush strokes, cleared by the eraser
//!
//! Enhancement never writes a painted point. Every edit returns the prior
//! state of the points it touched so strokes can be undone exactly.

use std::collections::HashSet;

use cloudpaint_config::DisplayConfig;
use tracing::debug;

use crate::enhance::Enhancement;
use crate::types::{Rgb, Tool};
use crate::validation::clamp_alpha;

/// The state of one point before an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRecord {
    pub index: usize,
    pub color: Rgb,
    pub painted: bool,
}

/// Color streams and painted mask of the loaded cloud
#[derive(Debug, Clone)]
pub struct AnnotationState {
    original: Vec<Rgb>,
    working: Vec<Rgb>,
    enhanced: Vec<Rgb>,
    painted: Vec<bool>,
    enhancement: Enhancement,
    /// Opacity of painted colors over the base in `display_colors`
    annotation_alpha: f64,
    annotations_visible: bool,
    /// Indices written since the last `take_dirty_indices`
    dirty: HashSet<usize>,
}

impl AnnotationState {
    /// State where nothing has been annotated yet
    pub fn new(original: Vec<Rgb>) -> Self {
        let working = original.clone();
        Self::with_working(original, working)
    }

    /// State for a cloud whose loaded colors may already carry annotations.
    ///
    /// Points whose working color differs from the original start painted,
    /// so enhancement leaves them alone.
    ///
    /// # Panics
    /// If the arrays differ in length.
    pub fn with_working(original: Vec<Rgb>, working: Vec<Rgb>) -> Self {
        assert_eq!(
            original.len(),
            working.len(),
            "original and working color arrays must have the same length"
        );
        let painted = original.iter().zip(&working).map(|(o, w)| o != w).collect();
        let enhanced = original.clone();
        Self {
            original,
            working,
            enhanced,
            painted,
            enhancement: Enhancement::Identity,
            annotation_alpha: 1.0,
            annotations_visible: true,
            dirty: HashSet::new(),
        }
    }

    /// Apply display settings from configuration
    pub fn apply_display_config(&mut self, config: &DisplayConfig) {
        self.annotation_alpha = clamp_alpha(config.annotation_alpha);
        self.annotations_visible = config.annotations_visible;
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    pub fn original(&self) -> &[Rgb] {
        &self.original
    }

    pub fn working(&self) -> &[Rgb] {
        &self.working
    }

    pub fn enhanced(&self) -> &[Rgb] {
        &self.enhanced
    }

    pub fn painted(&self) -> &[bool] {
        &self.painted
    }

    /// Working colors as raw RGB bytes
    pub fn working_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.working)
    }

    /// Number of painted points
    pub fn painted_count(&self) -> usize {
        self.painted.iter().filter(|&&p| p).count()
    }

    /// Whether any point carries an annotation
    pub fn has_edits(&self) -> bool {
        self.painted.iter().any(|&p| p)
    }

    /// Apply `tool` to `indices`
    pub fn apply_tool(&mut self, tool: Tool, indices: &[usize]) -> Vec<ChangeRecord> {
        match tool {
            Tool::Paint(color) => self.apply_color(indices, color),
            Tool::Erase => self.erase(indices),
        }
    }

    /// Paint `indices` with `color` and mark them painted.
    ///
    /// Returns the prior state of every point that actually changed.
    pub fn apply_color(&mut self, indices: &[usize], color: Rgb) -> Vec<ChangeRecord> {
        self.write(indices, |_, _| (color, true))
    }

    /// Restore the original color of `indices` and clear their painted flag
    pub fn erase(&mut self, indices: &[usize]) -> Vec<ChangeRecord> {
        self.write(indices, |state, i| (state.original[i], false))
    }

    fn write(
        &mut self,
        indices: &[usize],
        target: impl Fn(&Self, usize) -> (Rgb, bool),
    ) -> Vec<ChangeRecord> {
        let mut records = Vec::new();
        for &i in indices {
            if i >= self.working.len() {
                debug!("AnnotationState: index {} out of range, skipped", i);
                continue;
            }
            let (color, painted) = target(self, i);
            if self.working[i] == color && self.painted[i] == painted {
                continue;
            }
            records.push(ChangeRecord {
                index: i,
                color: self.working[i],
                painted: self.painted[i],
            });
            self.working[i] = color;
            self.painted[i] = painted;
            self.dirty.insert(i);
        }
        self.check_invariants();
        records
    }

    /// Write each record's color and flag back.
    ///
    /// Returns the records describing the state that was overwritten, so
    /// applying the result undoes this call.
    pub fn restore(&mut self, records: &[ChangeRecord]) -> Vec<ChangeRecord> {
        let mut inverse = Vec::with_capacity(records.len());
        for record in records {
            let i = record.index;
            if i >= self.working.len() {
                debug!("AnnotationState::restore: index {} out of range, skipped", i);
                continue;
            }
            inverse.push(ChangeRecord {
                index: i,
                color: self.working[i],
                painted: self.painted[i],
            });
            self.working[i] = record.color;
            self.painted[i] = record.painted;
            self.dirty.insert(i);
        }
        self.check_invariants();
        inverse
    }

    /// Whether the point is in the state `record` describes
    pub fn matches(&self, record: &ChangeRecord) -> bool {
        self.working.get(record.index) == Some(&record.color)
            && self.painted.get(record.index) == Some(&record.painted)
    }

    // ========================================================================
    // Enhancement
    // ========================================================================

    /// Current enhancement parameters
    pub fn enhancement(&self) -> Enhancement {
        self.enhancement
    }

    /// Recompute `enhanced` from `original`.
    ///
    /// Does not touch `working` or `painted`; use [`Self::merge_enhancement`]
    /// to commit.
    pub fn recompute_enhanced(&mut self, enhancement: Enhancement) {
        self.enhancement = enhancement.clamped();
        self.enhanced = self.enhancement.apply(&self.original);
        debug!(
            "recompute_enhanced: {:?} over {} points",
            self.enhancement,
            self.enhanced.len()
        );
        self.check_invariants();
    }

    /// Drop any enhancement (enhanced colors equal the originals)
    pub fn reset_enhancement(&mut self) {
        self.recompute_enhanced(Enhancement::Identity);
    }

    /// Whether committing the enhancement would change any working color
    pub fn has_pending_enhancement(&self) -> bool {
        self.working
            .iter()
            .zip(&self.enhanced)
            .zip(&self.painted)
            .any(|((w, e), &painted)| !painted && w != e)
    }

    /// Copy enhanced colors into `working` for every unpainted point.
    ///
    /// Returns the number of points changed. Painted points are never
    /// written.
    pub fn merge_enhancement(&mut self) -> usize {
        let mut changed = 0;
        for i in 0..self.working.len() {
            if self.painted[i] || self.working[i] == self.enhanced[i] {
                continue;
            }
            self.working[i] = self.enhanced[i];
            self.dirty.insert(i);
            changed += 1;
        }
        debug!("merge_enhancement: {} points updated", changed);
        self.check_invariants();
        changed
    }

    // ========================================================================
    // Display
    // ========================================================================

    pub fn annotation_alpha(&self) -> f64 {
        self.annotation_alpha
    }

    /// Set annotation opacity (clamped to 0-1); marks painted points dirty
    pub fn set_annotation_alpha(&mut self, alpha: f64) {
        self.annotation_alpha = clamp_alpha(alpha);
        self.mark_painted_dirty();
    }

    pub fn annotations_visible(&self) -> bool {
        self.annotations_visible
    }

    pub fn set_annotations_visible(&mut self, visible: bool) {
        self.annotations_visible = visible;
        self.mark_painted_dirty();
    }

    fn mark_painted_dirty(&mut self) {
        for (i, &painted) in self.painted.iter().enumerate() {
            if painted {
                self.dirty.insert(i);
            }
        }
    }

    /// Display color of one point.
    ///
    /// The enhanced color is the base; painted points show their label
    /// over it at `annotation_alpha` while annotations are visible.
    pub fn display_color(&self, index: usize) -> Option<Rgb> {
        let base = *self.enhanced.get(index)?;
        if !self.painted[index] || !self.annotations_visible {
            return Some(base);
        }
        let a = self.annotation_alpha;
        let label = self.working[index];
        Some(if a >= 0.999 {
            label
        } else if a <= 0.001 {
            base
        } else {
            label.blend_over(base, a)
        })
    }

    /// Display colors for every point
    pub fn display_colors(&self) -> Vec<Rgb> {
        (0..self.len())
            .filter_map(|i| self.display_color(i))
            .collect()
    }

    /// Get all dirty indices (sorted) and clear the dirty set
    pub fn take_dirty_indices(&mut self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.dirty.drain().collect();
        indices.sort_unstable();
        indices
    }

    /// Check if any points are dirty
    #[inline]
    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Array lengths must agree; a mismatch is a programming error.
    #[inline]
    fn check_invariants(&self) {
        debug_assert_eq!(self.working.len(), self.original.len());
        debug_assert_eq!(self.painted.len(), self.original.len());
        debug_assert_eq!(self.enhanced.len(), self.original.len());
    }
}
