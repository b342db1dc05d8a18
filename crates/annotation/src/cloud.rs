//! Loaded point clouds and baseline resolution.
//!
//! Decoders hand over positions plus an optional color array. Normalization
//! turns that into one color per point; baseline resolution decides which
//! colors count as "original" for erasing and enhancement.

use glam::DVec3;
use tracing::warn;

use crate::error::CloudError;
use crate::types::Rgb;

/// A point cloud as produced by a decoder
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    pub positions: Vec<DVec3>,
    /// One color per point, if the source file had colors
    pub colors: Option<Vec<Rgb>>,
}

impl PointCloud {
    pub fn new(positions: Vec<DVec3>, colors: Vec<Rgb>) -> Self {
        Self {
            positions,
            colors: Some(colors),
        }
    }

    /// Cloud without a color array
    pub fn from_positions(positions: Vec<DVec3>) -> Self {
        Self {
            positions,
            colors: None,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Resolve the optional color array into one color per point.
    ///
    /// Missing colors become black.
    pub fn normalize(self) -> Result<NormalizedCloud, CloudError> {
        let points = self.positions.len();
        let colors = match self.colors {
            Some(colors) if colors.len() != points => {
                return Err(CloudError::ColorCountMismatch {
                    points,
                    colors: colors.len(),
                });
            }
            Some(colors) => colors,
            None => vec![Rgb::BLACK; points],
        };
        Ok(NormalizedCloud {
            positions: self.positions,
            colors,
        })
    }
}

/// A cloud with exactly one color per point
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCloud {
    pub positions: Vec<DVec3>,
    pub colors: Vec<Rgb>,
}

/// How a supplied baseline cloud was used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineStatus {
    /// No baseline was supplied; the loaded colors are the originals
    NotProvided,
    /// Baseline colors became the originals
    Accepted,
    /// Baseline had no colors; the loaded colors are the originals
    MissingColors,
    /// Point counts differ; the loaded colors are the originals
    Rejected { expected: usize, found: usize },
}

/// Pick the original colors for `cloud`.
///
/// A baseline is only used when it has colors and the same point count.
pub fn resolve_baseline(cloud: &NormalizedCloud, baseline: Option<&PointCloud>) -> (Vec<Rgb>, BaselineStatus) {
    let Some(baseline) = baseline else {
        return (cloud.colors.clone(), BaselineStatus::NotProvided);
    };

    let expected = cloud.positions.len();
    if baseline.len() != expected {
        warn!(
            "Baseline cloud rejected: {} points, loaded cloud has {}",
            baseline.len(),
            expected
        );
        return (
            cloud.colors.clone(),
            BaselineStatus::Rejected {
                expected,
                found: baseline.len(),
            },
        );
    }

    match &baseline.colors {
        Some(colors) if colors.len() == expected => (colors.clone(), BaselineStatus::Accepted),
        Some(colors) => {
            warn!(
                "Baseline cloud rejected: {} colors for {} points",
                colors.len(),
                expected
            );
            (
                cloud.colors.clone(),
                BaselineStatus::Rejected {
                    expected,
                    found: colors.len(),
                },
            )
        }
        None => {
            warn!("Baseline cloud has no colors, using loaded colors as originals");
            (cloud.colors.clone(), BaselineStatus::MissingColors)
        }
    }
}

/// Whether `annotated` differs from its pristine counterpart `original`.
///
/// True when the point counts differ, or when both carry colors and any
/// color differs.
pub fn is_annotated_pair(annotated: &PointCloud, original: &PointCloud) -> bool {
    if annotated.len() != original.len() {
        return true;
    }
    match (&annotated.colors, &original.colors) {
        (Some(a), Some(o)) => a != o,
        _ => false,
    }
}

/// Summary of a cloud load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub point_count: usize,
    pub baseline: BaselineStatus,
    /// Points whose loaded color already differs from the original
    pub pre_annotated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(n: usize) -> Vec<DVec3> {
        (0..n).map(|i| DVec3::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_normalize_injects_black() {
        let cloud = PointCloud::from_positions(positions(3));
        let normalized = cloud.normalize().expect("valid cloud");
        assert_eq!(normalized.colors, vec![Rgb::BLACK; 3]);
    }

    #[test]
    fn test_normalize_rejects_count_mismatch() {
        let cloud = PointCloud::new(positions(3), vec![Rgb::new(1, 2, 3)]);
        assert_eq!(
            cloud.normalize(),
            Err(CloudError::ColorCountMismatch { points: 3, colors: 1 })
        );
    }

    #[test]
    fn test_normalize_empty_cloud() {
        let normalized = PointCloud::default().normalize().expect("empty is valid");
        assert!(normalized.positions.is_empty());
        assert!(normalized.colors.is_empty());
    }

    #[test]
    fn test_resolve_baseline() {
        let loaded = PointCloud::new(positions(2), vec![Rgb::new(255, 0, 0), Rgb::new(9, 9, 9)])
            .normalize()
            .expect("valid");

        let (original, status) = resolve_baseline(&loaded, None);
        assert_eq!(status, BaselineStatus::NotProvided);
        assert_eq!(original, loaded.colors);

        let pristine = PointCloud::new(positions(2), vec![Rgb::new(9, 9, 9); 2]);
        let (original, status) = resolve_baseline(&loaded, Some(&pristine));
        assert_eq!(status, BaselineStatus::Accepted);
        assert_eq!(original, vec![Rgb::new(9, 9, 9); 2]);

        let wrong = PointCloud::new(positions(5), vec![Rgb::BLACK; 5]);
        let (original, status) = resolve_baseline(&loaded, Some(&wrong));
        assert_eq!(status, BaselineStatus::Rejected { expected: 2, found: 5 });
        assert_eq!(original, loaded.colors);

        let colorless = PointCloud::from_positions(positions(2));
        let (_, status) = resolve_baseline(&loaded, Some(&colorless));
        assert_eq!(status, BaselineStatus::MissingColors);
    }

    #[test]
    fn test_is_annotated_pair() {
        let pristine = PointCloud::new(positions(2), vec![Rgb::BLACK; 2]);
        let same = pristine.clone();
        let painted = PointCloud::new(positions(2), vec![Rgb::BLACK, Rgb::new(255, 0, 0)]);
        let shorter = PointCloud::new(positions(1), vec![Rgb::BLACK]);
        let colorless = PointCloud::from_positions(positions(2));

        assert!(!is_annotated_pair(&same, &pristine));
        assert!(is_annotated_pair(&painted, &pristine));
        assert!(is_annotated_pair(&shorter, &pristine));
        assert!(!is_annotated_pair(&colorless, &pristine));
    }
}
