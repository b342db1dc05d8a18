//! Undo/redo history of brush strokes

use tracing::debug;

use crate::state::{AnnotationState, ChangeRecord};

/// One undoable unit: the prior state of every point a stroke changed
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDiff {
    /// Stroke ID this diff corresponds to
    pub stroke_id: u64,
    /// Point states to write back, one record per index
    pub records: Vec<ChangeRecord>,
}

impl StrokeDiff {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Undo and redo stacks (most recent at end)
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<StrokeDiff>,
    redo_stack: Vec<StrokeDiff>,
    /// Maximum undo levels; the oldest entry is dropped past this
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record a finished stroke. Clears the redo stack.
    pub fn push(&mut self, diff: StrokeDiff) {
        if diff.is_empty() {
            return;
        }
        self.redo_stack.clear();
        self.undo_stack.push(diff);
        if self.undo_stack.len() > self.limit {
            let dropped = self.undo_stack.remove(0);
            debug!("History: dropped oldest stroke {}", dropped.stroke_id);
        }
    }

    /// Undo the last stroke
    ///
    /// Returns true if an undo was performed, false if no undo available
    pub fn undo(&mut self, state: &mut AnnotationState) -> bool {
        let Some(diff) = self.undo_stack.pop() else {
            debug!("Undo: no entries available");
            return false;
        };

        debug!("Undoing stroke {} ({} points)", diff.stroke_id, diff.len());
        let inverse = state.restore(&diff.records);
        self.redo_stack.push(StrokeDiff {
            stroke_id: diff.stroke_id,
            records: inverse,
        });
        true
    }

    /// Redo the last undone stroke
    ///
    /// Returns true if a redo was performed, false if no redo available
    pub fn redo(&mut self, state: &mut AnnotationState) -> bool {
        let Some(diff) = self.redo_stack.pop() else {
            debug!("Redo: no entries available");
            return false;
        };

        debug!("Redoing stroke {} ({} points)", diff.stroke_id, diff.len());
        let inverse = state.restore(&diff.records);
        self.undo_stack.push(StrokeDiff {
            stroke_id: diff.stroke_id,
            records: inverse,
        });
        true
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}
