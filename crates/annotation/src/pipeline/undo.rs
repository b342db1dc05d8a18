//! Undo functionality for the annotation pipeline

use tracing::debug;

use super::AnnotationPipeline;

impl AnnotationPipeline {
    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.has_open_changes()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Get the number of undo levels available
    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    /// Get the number of redo levels available
    pub fn redo_count(&self) -> usize {
        self.history.redo_count()
    }

    /// Undo the last stroke
    ///
    /// An open stroke is sealed first, so it is the one undone. Returns true
    /// if an undo was performed, false if no undo available
    pub fn undo(&mut self) -> bool {
        self.seal_stroke();
        let Some(session) = self.session.as_mut() else {
            debug!("Undo: no cloud loaded");
            return false;
        };
        self.history.undo(&mut session.state)
    }

    /// Redo the last undone stroke
    ///
    /// Returns true if a redo was performed, false if no redo available
    pub fn redo(&mut self) -> bool {
        self.seal_stroke();
        let Some(session) = self.session.as_mut() else {
            debug!("Redo: no cloud loaded");
            return false;
        };
        self.history.redo(&mut session.state)
    }

    /// Whether the open stroke has recorded any edits
    fn has_open_changes(&self) -> bool {
        self.stroke.as_ref().is_some_and(|s| s.has_records())
    }
}

#[cfg(test)]
mod tests {
    use glam::{DVec2, DVec3};

    use crate::cloud::PointCloud;
    use crate::pipeline::AnnotationPipeline;
    use crate::projection::{PinholeCamera, ProjectionAdapter};
    use crate::types::{PointerEvent, Rgb, Tool};

    const RED: Rgb = Rgb::new(255, 0, 0);

    /// A dense patch facing a camera at z = 10
    fn setup() -> (AnnotationPipeline, impl ProjectionAdapter) {
        let mut positions = Vec::new();
        for iy in -20..=20 {
            for ix in -20..=20 {
                positions.push(DVec3::new(ix as f64 * 0.02, iy as f64 * 0.02, 0.0));
            }
        }
        let n = positions.len();
        let mut pipeline = AnnotationPipeline::new();
        pipeline
            .load_cloud(PointCloud::new(positions, vec![Rgb::new(40, 40, 40); n]), None)
            .expect("valid cloud");
        pipeline.set_tool(Tool::Paint(RED));
        pipeline.set_brush_radius(10.0);

        let camera = PinholeCamera::new(
            DVec3::new(0.0, 0.0, 10.0),
            DVec3::ZERO,
            DVec2::new(800.0, 600.0),
        );
        let view = pipeline.pinhole_view(camera);
        (pipeline, view)
    }

    #[test]
    fn test_undo_redo_stroke() {
        let (mut pipeline, view) = setup();
        let before = pipeline.working().to_vec();

        pipeline.pointer_down(&view, PointerEvent::at(400.0, 300.0)).expect("ready");
        pipeline.pointer_up();
        let after = pipeline.working().to_vec();
        assert_ne!(before, after);

        assert!(pipeline.undo());
        assert_eq!(pipeline.working(), before.as_slice());
        assert!(!pipeline.has_edits());
        assert!(pipeline.can_redo());

        assert!(pipeline.redo());
        assert_eq!(pipeline.working(), after.as_slice());
        assert!(!pipeline.redo());
    }

    #[test]
    fn test_undo_while_stroking_seals_first() {
        let (mut pipeline, view) = setup();
        pipeline.pointer_down(&view, PointerEvent::at(400.0, 300.0)).expect("ready");
        assert!(pipeline.can_undo());
        assert_eq!(pipeline.undo_count(), 0);

        assert!(pipeline.undo());
        assert!(!pipeline.is_stroking());
        assert!(!pipeline.has_edits());
        assert_eq!(pipeline.redo_count(), 1);
    }

    #[test]
    fn test_new_stroke_clears_redo() {
        let (mut pipeline, view) = setup();
        pipeline.pointer_down(&view, PointerEvent::at(400.0, 300.0)).expect("ready");
        pipeline.pointer_up();
        pipeline.undo();
        assert!(pipeline.can_redo());

        pipeline.pointer_down(&view, PointerEvent::at(410.0, 300.0)).expect("ready");
        pipeline.pointer_up();
        assert!(!pipeline.can_redo());
    }

    #[test]
    fn test_undo_without_cloud() {
        let mut pipeline = AnnotationPipeline::new();
        assert!(!pipeline.can_undo());
        assert!(!pipeline.undo());
        assert!(!pipeline.redo());
    }
}
