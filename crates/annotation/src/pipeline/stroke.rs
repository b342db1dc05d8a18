//! Stroke handling for the annotation pipeline

use std::collections::HashSet;

use glam::DVec2;
use tracing::debug;

use crate::error::AnnotationError;
use crate::history::StrokeDiff;
use crate::projection::ProjectionAdapter;
use crate::selection::BrushSelector;
use crate::state::ChangeRecord;
use crate::types::PointerEvent;

use super::{AnnotationPipeline, IndexSlot};

/// How a stroke ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// The stroke changed points and was pushed to the undo history
    Committed { stroke_id: u64, points: usize },
    /// The stroke ended with no net change
    Discarded,
    /// No stroke was open
    NotStroking,
}

/// A stroke between pointer-down and pointer-up
#[derive(Debug)]
pub(crate) struct OpenStroke {
    pub(crate) id: u64,
    /// Pre-stroke state, one record per index, in first-touch order
    records: Vec<ChangeRecord>,
    touched: HashSet<usize>,
    stamps: usize,
}

impl OpenStroke {
    fn new(id: u64) -> Self {
        Self {
            id,
            records: Vec::new(),
            touched: HashSet::new(),
            stamps: 0,
        }
    }

    pub(crate) fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    /// Keep the first recorded state of every index
    fn merge(&mut self, records: Vec<ChangeRecord>) {
        for record in records {
            if self.touched.insert(record.index) {
                self.records.push(record);
            }
        }
    }
}

impl AnnotationPipeline {
    /// Begin a stroke at the pointer position and apply the first stamp.
    ///
    /// The line constraint is taken from the event modifiers and holds for
    /// the whole stroke. A stroke that is still open is sealed first.
    pub fn pointer_down<A: ProjectionAdapter + ?Sized>(
        &mut self,
        adapter: &A,
        event: PointerEvent,
    ) -> Result<(), AnnotationError> {
        if !self.poll_index()? {
            return Err(AnnotationError::IndexNotReady);
        }
        if self.is_stroking() {
            debug!("pointer_down: stroke still open, sealing it");
            self.seal_stroke();
        }

        let stroke_id = self.next_stroke_id;
        self.next_stroke_id += 1;
        self.stroke = Some(OpenStroke::new(stroke_id));

        let line_constraint = event.modifiers.line_constraint;
        let stamps = self.path.begin(event.position, line_constraint);
        debug!(
            "Begin stroke {} at ({:.1}, {:.1}), line_constraint={}",
            stroke_id, event.position.x, event.position.y, line_constraint
        );
        self.apply_stamps(adapter, &stamps);
        Ok(())
    }

    /// Continue the stroke toward the pointer position.
    ///
    /// Ignored when no stroke is open. Returns the number of stamps applied.
    pub fn pointer_move<A: ProjectionAdapter + ?Sized>(
        &mut self,
        adapter: &A,
        event: PointerEvent,
    ) -> usize {
        if !self.is_stroking() {
            return 0;
        }
        let stamps = self.path.stroke_to(event.position, self.brush.radius_px());
        self.apply_stamps(adapter, &stamps);
        stamps.len()
    }

    /// End the current stroke
    pub fn pointer_up(&mut self) -> StrokeOutcome {
        self.seal_stroke()
    }

    /// End the current stroke after focus loss or a released capture.
    ///
    /// Edits already applied are kept and recorded exactly as on pointer-up.
    pub fn cancel(&mut self) -> StrokeOutcome {
        self.seal_stroke()
    }

    /// Check if a stroke is currently in progress
    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Apply stamps to the loaded cloud and record them in the open stroke
    fn apply_stamps<A: ProjectionAdapter + ?Sized>(&mut self, adapter: &A, stamps: &[DVec2]) {
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let IndexSlot::Ready(index) = &session.index else {
            return;
        };

        let selector = BrushSelector::new(index, &session.positions);
        for &center in stamps {
            let indices = selector.select(adapter, center, &self.brush);
            if indices.is_empty() {
                continue;
            }
            let records = session.state.apply_tool(self.brush.tool, &indices);
            debug!(
                "  stamp at ({:.1}, {:.1}): {} selected, {} changed",
                center.x,
                center.y,
                indices.len(),
                records.len()
            );
            stroke.merge(records);
            stroke.stamps += 1;
        }
    }

    /// Close the open stroke and push its net change to the history
    pub(crate) fn seal_stroke(&mut self) -> StrokeOutcome {
        self.path.end();
        let Some(stroke) = self.stroke.take() else {
            return StrokeOutcome::NotStroking;
        };
        let Some(session) = self.session.as_ref() else {
            return StrokeOutcome::Discarded;
        };

        // Points painted and then erased within the stroke carry no change
        let records: Vec<ChangeRecord> = stroke
            .records
            .into_iter()
            .filter(|r| !session.state.matches(r))
            .collect();

        if records.is_empty() {
            debug!("Discarded stroke {} (no net change)", stroke.id);
            return StrokeOutcome::Discarded;
        }

        let points = records.len();
        self.history.push(StrokeDiff {
            stroke_id: stroke.id,
            records,
        });
        debug!(
            "Saved undo entry for stroke {} ({} points, {} stamps)",
            stroke.id, points, stroke.stamps
        );
        StrokeOutcome::Committed {
            stroke_id: stroke.id,
            points,
        }
    }

    /// Drop the open stroke without recording it
    pub(crate) fn discard_stroke(&mut self) {
        self.path.end();
        if let Some(stroke) = self.stroke.take() {
            debug!("Dropped open stroke {}", stroke.id);
        }
    }
}
