//! Complete annotation pipeline
//!
//! This module connects:
//! - Cloud loading (normalization, baseline, spatial index)
//! - Pointer input (stamp placement along a drag)
//! - Brush selection (screen-space footprint)
//! - Annotation state (color edits, enhancement)
//! - Undo/redo history
//!
//! The pipeline is driven by whatever renderer owns the window; it never
//! renders and never blocks.

mod stroke;
mod undo;

use cloudpaint_config::AnnotatorConfig;
use glam::DVec3;
use tracing::{debug, info};

use crate::brush::{BrushSettings, StampPath};
use crate::cloud::{LoadReport, PointCloud, resolve_baseline};
use crate::enhance::Enhancement;
use crate::error::{AnnotationError, CloudError};
use crate::history::History;
use crate::projection::{PinholeCamera, PinholeView};
use crate::spatial::{KdTree, PendingIndex};
use crate::state::AnnotationState;
use crate::types::{FootprintMode, Rgb, Tool};

pub use stroke::StrokeOutcome;

use stroke::OpenStroke;

/// Spatial index of the loaded cloud
#[derive(Debug)]
enum IndexSlot {
    Ready(KdTree),
    Pending(PendingIndex),
}

/// Everything scoped to one loaded cloud
#[derive(Debug)]
struct CloudSession {
    positions: Vec<DVec3>,
    state: AnnotationState,
    index: IndexSlot,
}

/// Annotation pipeline for one viewer
///
/// This struct manages the full annotation workflow:
/// 1. A cloud comes in via `load_cloud` (or `load_cloud_deferred`)
/// 2. Input comes in via `pointer_down`, `pointer_move`, `pointer_up`
/// 3. Each stamp selects points under the brush and recolors them
/// 4. Finished strokes are pushed to the undo history
/// 5. Dirty points are tracked for renderer upload
#[derive(Debug)]
pub struct AnnotationPipeline {
    session: Option<CloudSession>,
    /// Current brush
    pub(crate) brush: BrushSettings,
    /// Stamp placement for the current drag
    pub(crate) path: StampPath,
    /// Stroke being recorded (None if not painting)
    pub(crate) stroke: Option<OpenStroke>,
    pub(crate) history: History,
    pub(crate) next_stroke_id: u64,
    config: AnnotatorConfig,
}

impl Default for AnnotationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationPipeline {
    /// Create a pipeline with default configuration
    pub fn new() -> Self {
        Self::with_config(AnnotatorConfig::default())
    }

    pub fn with_config(config: AnnotatorConfig) -> Self {
        let config = config.clamped();
        Self {
            session: None,
            brush: BrushSettings::from_config(&config.brush),
            path: StampPath::new(config.stroke.spacing_fraction),
            stroke: None,
            history: History::new(config.stroke.history_limit),
            next_stroke_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    // ========================================================================
    // Cloud lifecycle
    // ========================================================================

    /// Load a cloud and build its spatial index before returning.
    ///
    /// `baseline` is the pristine version of the same cloud, if known; its
    /// colors become the originals when the point counts match. Any open
    /// stroke and all history of the previous cloud are dropped.
    pub fn load_cloud(
        &mut self,
        cloud: PointCloud,
        baseline: Option<&PointCloud>,
    ) -> Result<LoadReport, CloudError> {
        self.install(cloud, baseline, |positions| IndexSlot::Ready(KdTree::build(positions)))
    }

    /// Load a cloud and build its spatial index on a worker thread.
    ///
    /// Paint input is refused with [`AnnotationError::IndexNotReady`] until
    /// [`Self::poll_index`] reports the index ready.
    pub fn load_cloud_deferred(
        &mut self,
        cloud: PointCloud,
        baseline: Option<&PointCloud>,
    ) -> Result<LoadReport, CloudError> {
        self.install(cloud, baseline, |positions| {
            IndexSlot::Pending(PendingIndex::spawn(positions.to_vec()))
        })
    }

    fn install(
        &mut self,
        cloud: PointCloud,
        baseline: Option<&PointCloud>,
        build_index: impl FnOnce(&[DVec3]) -> IndexSlot,
    ) -> Result<LoadReport, CloudError> {
        let cloud = cloud.normalize()?;
        let (original, baseline) = resolve_baseline(&cloud, baseline);

        let mut state = AnnotationState::with_working(original, cloud.colors);
        state.apply_display_config(&self.config.display);
        let report = LoadReport {
            point_count: cloud.positions.len(),
            baseline,
            pre_annotated: state.painted_count(),
        };

        self.discard_stroke();
        self.history.clear();
        let index = build_index(&cloud.positions);
        self.session = Some(CloudSession {
            positions: cloud.positions,
            state,
            index,
        });

        info!(
            "Loaded cloud: {} points, baseline {:?}, {} pre-annotated",
            report.point_count, report.baseline, report.pre_annotated
        );
        Ok(report)
    }

    /// Drop the loaded cloud, its open stroke, and its history
    pub fn unload(&mut self) {
        self.discard_stroke();
        self.history.clear();
        if self.session.take().is_some() {
            debug!("Unloaded cloud");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    /// Whether paint input is accepted right now
    pub fn is_ready(&self) -> bool {
        matches!(
            self.session,
            Some(CloudSession {
                index: IndexSlot::Ready(_),
                ..
            })
        )
    }

    /// Install a finished background index, if any.
    ///
    /// Returns whether the index is ready.
    pub fn poll_index(&mut self) -> Result<bool, AnnotationError> {
        let session = self.session.as_mut().ok_or(AnnotationError::NoCloudLoaded)?;
        let tree = match &mut session.index {
            IndexSlot::Ready(_) => return Ok(true),
            IndexSlot::Pending(pending) => match pending.try_take()? {
                Some(tree) => tree,
                None => return Ok(false),
            },
        };
        info!("Spatial index installed ({} points)", tree.len());
        session.index = IndexSlot::Ready(tree);
        Ok(true)
    }

    /// Positions of the loaded cloud
    pub fn positions(&self) -> &[DVec3] {
        match &self.session {
            Some(session) => &session.positions,
            None => &[],
        }
    }

    /// Annotation state of the loaded cloud
    pub fn state(&self) -> Option<&AnnotationState> {
        self.session.as_ref().map(|s| &s.state)
    }

    /// Reference adapter over the loaded positions, picking within the
    /// configured tolerance
    pub fn pinhole_view(&self, camera: PinholeCamera) -> PinholeView {
        PinholeView::new(
            camera,
            self.positions().to_vec(),
            self.config.brush.pick_tolerance_px,
        )
    }

    fn state_mut(&mut self) -> Option<&mut AnnotationState> {
        self.session.as_mut().map(|s| &mut s.state)
    }

    // ========================================================================
    // Brush
    // ========================================================================

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    /// Set the brush radius in pixels (clamped to 1-200)
    pub fn set_brush_radius(&mut self, radius_px: f64) {
        self.brush.set_radius_px(radius_px);
    }

    /// Set the rendered point size in pixels (clamped to 1-20)
    pub fn set_point_size(&mut self, size_px: f64) {
        self.brush.set_point_size_px(size_px);
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.brush.tool = tool;
    }

    pub fn set_footprint(&mut self, footprint: FootprintMode) {
        self.brush.footprint = footprint;
    }

    /// Cursor ring radius for the current footprint
    pub fn ring_radius(&self) -> f64 {
        self.brush.ring_radius()
    }

    // ========================================================================
    // Colors
    // ========================================================================

    /// Live label colors; empty when nothing is loaded
    pub fn working(&self) -> &[Rgb] {
        match self.state() {
            Some(state) => state.working(),
            None => &[],
        }
    }

    /// Live label colors as raw RGB bytes, for writers
    pub fn working_bytes(&self) -> &[u8] {
        match self.state() {
            Some(state) => state.working_bytes(),
            None => &[],
        }
    }

    /// Snapshot of the painted mask
    pub fn painted(&self) -> Vec<bool> {
        self.state().map(|s| s.painted().to_vec()).unwrap_or_default()
    }

    pub fn has_edits(&self) -> bool {
        self.state().is_some_and(|s| s.has_edits())
    }

    pub fn display_colors(&self) -> Vec<Rgb> {
        self.state().map(|s| s.display_colors()).unwrap_or_default()
    }

    pub fn take_dirty_indices(&mut self) -> Vec<usize> {
        self.state_mut()
            .map(|s| s.take_dirty_indices())
            .unwrap_or_default()
    }

    pub fn set_annotation_alpha(&mut self, alpha: f64) {
        self.config.display.annotation_alpha = alpha;
        if let Some(state) = self.state_mut() {
            state.set_annotation_alpha(alpha);
        }
    }

    pub fn set_annotations_visible(&mut self, visible: bool) {
        self.config.display.annotations_visible = visible;
        if let Some(state) = self.state_mut() {
            state.set_annotations_visible(visible);
        }
    }

    // ========================================================================
    // Enhancement
    // ========================================================================

    pub fn recompute_enhanced(&mut self, enhancement: Enhancement) {
        if let Some(state) = self.state_mut() {
            state.recompute_enhanced(enhancement);
        }
    }

    pub fn reset_enhancement(&mut self) {
        if let Some(state) = self.state_mut() {
            state.reset_enhancement();
        }
    }

    pub fn has_pending_enhancement(&self) -> bool {
        self.state().is_some_and(|s| s.has_pending_enhancement())
    }

    /// Commit enhanced colors into the working colors of unpainted points.
    ///
    /// Seals any open stroke first. Returns the number of points changed.
    pub fn merge_enhancement(&mut self) -> usize {
        self.seal_stroke();
        self.state_mut().map_or(0, |s| s.merge_enhancement())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud(n: usize) -> PointCloud {
        let positions = (0..n).map(|i| DVec3::new(i as f64, 0.0, 0.0)).collect();
        PointCloud::new(positions, vec![Rgb::new(50, 50, 50); n])
    }

    #[test]
    fn test_new_pipeline_is_empty() {
        let pipeline = AnnotationPipeline::new();
        assert!(!pipeline.is_loaded());
        assert!(!pipeline.is_ready());
        assert!(pipeline.working().is_empty());
        assert!(pipeline.working_bytes().is_empty());
        assert!(!pipeline.has_edits());
        assert!(!pipeline.can_undo());
    }

    #[test]
    fn test_load_cloud() {
        let mut pipeline = AnnotationPipeline::new();
        let report = pipeline.load_cloud(cloud(4), None).expect("valid cloud");
        assert_eq!(report.point_count, 4);
        assert_eq!(report.pre_annotated, 0);
        assert!(pipeline.is_ready());
        assert_eq!(pipeline.working().len(), 4);
        assert_eq!(pipeline.working_bytes().len(), 12);
        assert_eq!(pipeline.painted(), vec![false; 4]);
    }

    #[test]
    fn test_load_rejects_malformed_cloud() {
        let mut pipeline = AnnotationPipeline::new();
        let bad = PointCloud::new(vec![DVec3::ZERO; 3], vec![Rgb::BLACK; 2]);
        assert!(pipeline.load_cloud(bad, None).is_err());
        assert!(!pipeline.is_loaded());
    }

    #[test]
    fn test_load_with_baseline_marks_existing_labels() {
        let mut pipeline = AnnotationPipeline::new();
        let pristine = cloud(3);
        let mut saved = cloud(3);
        if let Some(colors) = saved.colors.as_mut() {
            colors[1] = Rgb::new(255, 0, 0);
        }

        let report = pipeline.load_cloud(saved, Some(&pristine)).expect("valid");
        assert_eq!(report.pre_annotated, 1);
        assert_eq!(pipeline.painted(), vec![false, true, false]);
        assert!(pipeline.has_edits());
    }

    #[test]
    fn test_deferred_index() {
        let mut pipeline = AnnotationPipeline::new();
        assert_eq!(pipeline.poll_index(), Err(AnnotationError::NoCloudLoaded));

        pipeline.load_cloud_deferred(cloud(1000), None).expect("valid");
        assert!(pipeline.is_loaded());
        // Spin until the worker finishes
        while !pipeline.poll_index().expect("build succeeds") {
            std::thread::yield_now();
        }
        assert!(pipeline.is_ready());
    }

    #[test]
    fn test_unload() {
        let mut pipeline = AnnotationPipeline::new();
        pipeline.load_cloud(cloud(2), None).expect("valid");
        pipeline.unload();
        assert!(!pipeline.is_loaded());
        assert!(pipeline.state().is_none());
        assert!(pipeline.display_colors().is_empty());
    }

    #[test]
    fn test_brush_setters_clamp() {
        let mut pipeline = AnnotationPipeline::new();
        pipeline.set_brush_radius(500.0);
        pipeline.set_point_size(0.0);
        pipeline.set_tool(Tool::Erase);
        pipeline.set_footprint(FootprintMode::Contained);
        assert_eq!(pipeline.brush().radius_px(), 200.0);
        assert_eq!(pipeline.brush().point_size_px(), 1.0);
        assert_eq!(pipeline.brush().tool, Tool::Erase);
        assert_eq!(pipeline.brush().footprint, FootprintMode::Contained);
    }

    #[test]
    fn test_display_settings_survive_reload() {
        let mut pipeline = AnnotationPipeline::new();
        pipeline.set_annotation_alpha(0.4);
        pipeline.set_annotations_visible(false);
        pipeline.load_cloud(cloud(2), None).expect("valid");
        let state = pipeline.state().expect("loaded");
        assert!((state.annotation_alpha() - 0.4).abs() < 1e-12);
        assert!(!state.annotations_visible());
    }

    #[test]
    fn test_enhancement_forwarding() {
        let mut pipeline = AnnotationPipeline::new();
        let positions = vec![DVec3::ZERO, DVec3::X];
        pipeline
            .load_cloud(
                PointCloud::new(positions, vec![Rgb::new(10, 10, 10), Rgb::new(200, 200, 200)]),
                None,
            )
            .expect("valid");

        pipeline.recompute_enhanced(Enhancement::gamma(1.0));
        assert!(pipeline.has_pending_enhancement());
        assert_eq!(pipeline.merge_enhancement(), 2);
        assert!(!pipeline.has_pending_enhancement());
        assert_eq!(pipeline.working()[0], Rgb::new(0, 0, 0));

        pipeline.reset_enhancement();
        assert!(pipeline.has_pending_enhancement());
    }
}
