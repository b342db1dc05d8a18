//! Contrast enhancement of the original colors.
//!
//! Enhancements are pure functions of the original color array. Each one is
//! reduced to a per-channel 256-entry lookup table, then applied to every
//! point.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PERCENTILE_HIGH, DEFAULT_PERCENTILE_LOW, STRETCH_EPSILON};
use crate::types::Rgb;
use crate::validation::{clamp_gamma, clamp_percentiles};

/// Parameters of the derived "enhanced" color stream
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Enhancement {
    /// Enhanced colors equal the originals
    #[default]
    Identity,
    /// Per-channel min-max normalization followed by `x^gamma`
    Gamma { gamma: f64 },
    /// Per-channel percentile stretch, clipped to the full range
    PercentileStretch { low: f64, high: f64 },
}

impl Enhancement {
    pub fn gamma(gamma: f64) -> Self {
        Self::Gamma {
            gamma: clamp_gamma(gamma),
        }
    }

    /// The 2nd-98th percentile auto-contrast
    pub fn auto_contrast() -> Self {
        Self::PercentileStretch {
            low: DEFAULT_PERCENTILE_LOW,
            high: DEFAULT_PERCENTILE_HIGH,
        }
    }

    /// Same enhancement with parameters pulled into range
    pub fn clamped(self) -> Self {
        match self {
            Self::Identity => Self::Identity,
            Self::Gamma { gamma } => Self::gamma(gamma),
            Self::PercentileStretch { low, high } => {
                let (low, high) = clamp_percentiles(low, high);
                Self::PercentileStretch { low, high }
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    /// Derive enhanced colors from `original`
    pub fn apply(&self, original: &[Rgb]) -> Vec<Rgb> {
        if original.is_empty() || self.is_identity() {
            return original.to_vec();
        }
        let luts = self.build_luts(original);
        original
            .iter()
            .map(|c| Rgb::new(luts[0][c.r as usize], luts[1][c.g as usize], luts[2][c.b as usize]))
            .collect()
    }

    fn build_luts(&self, original: &[Rgb]) -> [[u8; 256]; 3] {
        let histograms = ChannelHistograms::from_colors(original);
        let params = self.clamped();
        let mut luts = [[0u8; 256]; 3];

        for (channel, lut) in luts.iter_mut().enumerate() {
            let hist = &histograms.counts[channel];
            *lut = match params {
                Self::Identity => identity_lut(),
                Self::Gamma { gamma } => {
                    let (min, max) = min_max(hist);
                    build_gamma_lut(f64::from(min) / 255.0, f64::from(max) / 255.0, gamma)
                }
                Self::PercentileStretch { low, high } => {
                    let lo = percentile(hist, histograms.total, low) / 255.0;
                    let hi = percentile(hist, histograms.total, high) / 255.0;
                    build_stretch_lut(lo, hi)
                }
            };
        }
        luts
    }
}

/// 256-bin histograms, one per channel
struct ChannelHistograms {
    counts: [[usize; 256]; 3],
    total: usize,
}

impl ChannelHistograms {
    fn from_colors(colors: &[Rgb]) -> Self {
        let mut counts = [[0usize; 256]; 3];
        for c in colors {
            counts[0][c.r as usize] += 1;
            counts[1][c.g as usize] += 1;
            counts[2][c.b as usize] += 1;
        }
        Self {
            counts,
            total: colors.len(),
        }
    }
}

fn identity_lut() -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = i as u8;
    }
    lut
}

/// Smallest and largest populated bin
fn min_max(hist: &[usize; 256]) -> (u8, u8) {
    let min = hist.iter().position(|&n| n > 0).unwrap_or(0);
    let max = hist.iter().rposition(|&n| n > 0).unwrap_or(255);
    (min as u8, max as u8)
}

/// The `k`-th smallest value (0-based) of the channel
fn kth_value(hist: &[usize; 256], k: usize) -> f64 {
    let mut seen = 0usize;
    for (value, &count) in hist.iter().enumerate() {
        seen += count;
        if seen > k {
            return value as f64;
        }
    }
    255.0
}

/// Percentile with linear interpolation between closest ranks
fn percentile(hist: &[usize; 256], total: usize, p: f64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rank = p / 100.0 * (total - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let lo = kth_value(hist, lower);
    let hi = kth_value(hist, upper);
    lo + (hi - lo) * (rank - lower as f64)
}

/// Normalized values below `min`/above `max` are clipped before the curve.
fn build_gamma_lut(min: f64, max: f64, gamma: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let range = max - min + STRETCH_EPSILON;
    for (i, v) in lut.iter_mut().enumerate() {
        let x = ((i as f64 / 255.0 - min) / range).clamp(0.0, 1.0);
        *v = to_channel(x.powf(gamma));
    }
    lut
}

fn build_stretch_lut(lo: f64, hi: f64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let range = hi - lo + STRETCH_EPSILON;
    for (i, v) in lut.iter_mut().enumerate() {
        let x = ((i as f64 / 255.0 - lo) / range).clamp(0.0, 1.0);
        *v = to_channel(x);
    }
    lut
}

/// Normalized 0-1 to a byte, truncating
#[inline]
fn to_channel(x: f64) -> u8 {
    (x * 255.0).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(v: u8) -> Rgb {
        Rgb::new(v, v, v)
    }

    #[test]
    fn test_identity_is_copy() {
        let original = vec![gray(10), Rgb::new(1, 2, 3)];
        assert_eq!(Enhancement::Identity.apply(&original), original);
    }

    #[test]
    fn test_empty_input() {
        assert!(Enhancement::gamma(2.0).apply(&[]).is_empty());
        assert!(Enhancement::auto_contrast().apply(&[]).is_empty());
    }

    #[test]
    fn test_gamma_one_stretches_range() {
        let original = vec![gray(50), gray(100), gray(150)];
        let enhanced = Enhancement::gamma(1.0).apply(&original);
        assert_eq!(enhanced[0], gray(0));
        // 0.5 / (1 + eps) * 255 truncates to 127
        assert_eq!(enhanced[1], gray(127));
        // 1 / (1 + eps) truncates just below full scale
        assert_eq!(enhanced[2], gray(254));
    }

    #[test]
    fn test_gamma_darkens_midtones() {
        let original = vec![gray(0), gray(128), gray(255)];
        let bright = Enhancement::gamma(0.5).apply(&original);
        let dark = Enhancement::gamma(2.0).apply(&original);
        assert!(bright[1].r > original[1].r);
        assert!(dark[1].r < original[1].r);
    }

    #[test]
    fn test_gamma_changes_dark_point() {
        let original = vec![gray(10), gray(200)];
        let enhanced = Enhancement::gamma(1.5).apply(&original);
        assert_eq!(enhanced[0], gray(0));
        assert_ne!(enhanced[0], original[0]);
    }

    #[test]
    fn test_channels_are_independent() {
        let original = vec![Rgb::new(0, 100, 7), Rgb::new(255, 200, 7)];
        let enhanced = Enhancement::gamma(1.0).apply(&original);
        assert_eq!(enhanced[0].r, 0);
        assert_eq!(enhanced[0].g, 0);
        assert_eq!(enhanced[1].g, 254);
        // Constant channel collapses to zero
        assert_eq!(enhanced[0].b, 0);
        assert_eq!(enhanced[1].b, 0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let mut hist = [0usize; 256];
        for v in [10usize, 20, 30, 40, 50] {
            hist[v] = 1;
        }
        assert_eq!(percentile(&hist, 5, 0.0), 10.0);
        assert_eq!(percentile(&hist, 5, 100.0), 50.0);
        assert_eq!(percentile(&hist, 5, 50.0), 30.0);
        // rank 0.5 between 10 and 20
        assert!((percentile(&hist, 5, 12.5) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_auto_contrast_clips_outliers() {
        let mut original: Vec<Rgb> = (0..100).map(|i| gray(100 + (i % 50) as u8)).collect();
        original.push(gray(0));
        original.push(gray(255));
        let enhanced = Enhancement::auto_contrast().apply(&original);
        assert_eq!(enhanced[100], gray(0));
        assert_eq!(enhanced[101], gray(255));
        // The bulk now spans most of the range
        let max_bulk = enhanced[..100].iter().map(|c| c.r).max().unwrap_or(0);
        assert!(max_bulk > 240);
    }

    #[test]
    fn test_clamped_parameters() {
        assert_eq!(
            Enhancement::Gamma { gamma: 100.0 }.clamped(),
            Enhancement::Gamma { gamma: 10.0 }
        );
        assert_eq!(
            Enhancement::PercentileStretch { low: 99.0, high: 1.0 }.clamped(),
            Enhancement::PercentileStretch { low: 1.0, high: 99.0 }
        );
    }
}
