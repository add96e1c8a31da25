//! Cover side classification
//!
//! Decides which half of a wraparound cover spread carries the printed front
//! cover by comparing the visual complexity of the two halves around the seam.
//! Edge density dominates; color and brightness variance only break near-ties.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sampler::{luma_of, AnalysisBuffer, ResampleFilter};
use crate::seam::{SeamDetector, SeamOptions, SeamResult};
use crate::types::{Result, Side};

// ============================================================
// Constants
// ============================================================

/// Weight of mean horizontal gradient
const DEFAULT_EDGE_DENSITY_WEIGHT: f64 = 3.0;

/// Weight of summed per-channel variance
const DEFAULT_COLOR_VARIANCE_WEIGHT: f64 = 0.01;

/// Weight of luminance variance
const DEFAULT_BRIGHTNESS_VARIANCE_WEIGHT: f64 = 0.01;

/// Cover side scoring weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverSideOptions {
    pub edge_weight: f64,
    pub color_weight: f64,
    pub brightness_weight: f64,
}

impl Default for CoverSideOptions {
    fn default() -> Self {
        Self {
            edge_weight: DEFAULT_EDGE_DENSITY_WEIGHT,
            color_weight: DEFAULT_COLOR_VARIANCE_WEIGHT,
            brightness_weight: DEFAULT_BRIGHTNESS_VARIANCE_WEIGHT,
        }
    }
}

/// Complexity measurements of one vertical band
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HalfComplexity {
    /// Summed interior horizontal gradient divided by the band area
    pub edge_density: f64,
    /// Sum of R, G and B variances
    pub color_variance: f64,
    /// Luminance variance
    pub brightness_variance: f64,
    /// Weighted score
    pub score: f64,
}

/// Scores of both halves and the resulting decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverSideScores {
    pub seam: SeamResult,
    pub left: HalfComplexity,
    pub right: HalfComplexity,
    pub cover: Side,
}

/// Running sums for a single band
#[derive(Default)]
struct BandAccumulator {
    brightness: f64,
    brightness_sq: f64,
    edge: f64,
    rgb: [f64; 3],
    rgb_sq: [f64; 3],
}

/// Picks the front-cover half of a spread
pub struct CoverSideClassifier;

impl CoverSideClassifier {
    /// Classify which half of `image` is the front cover
    pub fn classify(
        image: &DynamicImage,
        seam_options: &SeamOptions,
        options: &CoverSideOptions,
        filter: ResampleFilter,
    ) -> Result<Side> {
        Ok(Self::score(image, seam_options, options, filter)?.cover)
    }

    /// Full scoring breakdown for `image`
    pub fn score(
        image: &DynamicImage,
        seam_options: &SeamOptions,
        options: &CoverSideOptions,
        filter: ResampleFilter,
    ) -> Result<CoverSideScores> {
        let buffer = AnalysisBuffer::from_image(image, seam_options.analysis_height, filter)?;
        let seam = SeamDetector::detect(&buffer, seam_options);
        Ok(Self::score_buffer(&buffer, seam, options))
    }

    /// Score both halves of an analysis buffer split at `seam`
    pub fn score_buffer(
        buffer: &AnalysisBuffer,
        seam: SeamResult,
        options: &CoverSideOptions,
    ) -> CoverSideScores {
        let split = seam.column.min(buffer.width());
        let left = Self::half_complexity(buffer, 0, split, options);
        let right = Self::half_complexity(buffer, split, buffer.width(), options);

        // equal scores resolve to the left half
        let cover = if left.score >= right.score {
            Side::Left
        } else {
            Side::Right
        };

        debug!(
            "Cover side detection: leftScore={:.4}, rightScore={:.4}, seam={} -> {}",
            left.score, right.score, seam.column, cover
        );

        CoverSideScores {
            seam,
            left,
            right,
            cover,
        }
    }

    /// Complexity of the band `[x_start, x_end)`; an empty band scores zero
    pub fn half_complexity(
        buffer: &AnalysisBuffer,
        x_start: u32,
        x_end: u32,
        options: &CoverSideOptions,
    ) -> HalfComplexity {
        if x_end <= x_start {
            return HalfComplexity::default();
        }

        let luma = buffer.luma();
        let mut acc = BandAccumulator::default();

        for (x, y, pixel) in buffer.band(x_start..x_end) {
            let gray = luma_of(pixel.0);
            acc.brightness += gray;
            acc.brightness_sq += gray * gray;
            for c in 0..3 {
                let v = pixel.0[c] as f64;
                acc.rgb[c] += v;
                acc.rgb_sq[c] += v * v;
            }
            // gradient only inside the band, never across its borders
            if x > x_start && x + 1 < x_end {
                acc.edge += luma.horizontal_gradient(x, y);
            }
        }

        let total = (x_end - x_start) as f64 * buffer.height() as f64;
        let variance = |sum: f64, sum_sq: f64| {
            let m = sum / total;
            sum_sq / total - m * m
        };

        let brightness_variance = variance(acc.brightness, acc.brightness_sq);
        let color_variance = (0..3).map(|c| variance(acc.rgb[c], acc.rgb_sq[c])).sum::<f64>();
        let edge_density = acc.edge / total;

        let score = edge_density * options.edge_weight
            + color_variance * options.color_weight
            + brightness_variance * options.brightness_weight;

        HalfComplexity {
            edge_density,
            color_variance,
            brightness_variance,
            score,
        }
    }
}
