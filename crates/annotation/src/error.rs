//! Error types for the annotation core.

use thiserror::Error;

/// Errors surfaced to the caller driving pointer interaction.
///
/// Both variants mean "do not accept paint input yet"; neither is meant to
/// be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("No point cloud is loaded")]
    NoCloudLoaded,

    #[error("Spatial index is not ready yet")]
    IndexNotReady,

    #[error("Spatial index build failed")]
    IndexBuildFailed,
}

/// Errors raised while normalizing a loaded cloud.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    #[error("Color count {colors} does not match point count {points}")]
    ColorCountMismatch { points: usize, colors: usize },
}
