//! Cover Region Detection module
//!
//! Strips back cover, spine, flaps and scanner margin from a full wraparound
//! cover scan, keeping only the front-cover band at full height.
//!
//! # Algorithm
//!
//! 1. Downscale to 400 px height
//! 2. Horizontal gradient `|L(x+1, y) - L(x-1, y)|` for every interior pixel
//! 3. Per column, the fraction of rows whose gradient exceeds 30.0 ("continuity").
//!    Frame and spine lines run the full height; content edges are scattered.
//! 4. Smooth continuity (window 3)
//! 5. Strongest column in 5%-45% (left boundary) and 55%-95% (right boundary)
//! 6. Boundaries below 0.15 continuity fall back to the image edge; when both do,
//!    there is no frame
//! 7. Map back to full resolution and reject crops that keep 85% or more of the width

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::sampler::{AnalysisBuffer, ResampleFilter};
use crate::signal::{find_peak, smooth};
use crate::split::crop;
use crate::types::{ensure_non_degenerate, CropRect, Result, SpreadError};

// ============================================================
// Constants
// ============================================================

/// Analysis buffer height for border detection
const DEFAULT_REGION_ANALYSIS_HEIGHT: u32 = 400;

/// Gradient above which a pixel counts as part of a vertical edge (0-255 luma)
const DEFAULT_EDGE_THRESHOLD: f64 = 30.0;

/// Moving-average window applied to continuity
const DEFAULT_REGION_SMOOTHING_WINDOW: usize = 3;

/// Minimum continuity for a boundary to be accepted
const DEFAULT_MIN_CONTINUITY: f64 = 0.15;

/// Crops keeping at least this fraction of the width are discarded
const DEFAULT_MAX_WIDTH_RATIO: f64 = 0.85;

/// Left boundary search range (fractions of width)
const DEFAULT_LEFT_SEARCH: (f64, f64) = (0.05, 0.45);

/// Right boundary search range (fractions of width)
const DEFAULT_RIGHT_SEARCH: (f64, f64) = (0.55, 0.95);

// ============================================================
// Options
// ============================================================

/// Border detection options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverRegionOptions {
    /// Height of the downscaled analysis buffer
    pub analysis_height: u32,
    /// Gradient threshold for continuity counting
    pub edge_threshold: f64,
    /// Continuity smoothing window
    pub smoothing_window: usize,
    /// Minimum accepted boundary continuity (0.0-1.0)
    pub min_continuity: f64,
    /// Maximum kept width ratio (0.0-1.0)
    pub max_width_ratio: f64,
    /// Left boundary search range
    pub left_search: (f64, f64),
    /// Right boundary search range
    pub right_search: (f64, f64),
}

impl Default for CoverRegionOptions {
    fn default() -> Self {
        Self {
            analysis_height: DEFAULT_REGION_ANALYSIS_HEIGHT,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            smoothing_window: DEFAULT_REGION_SMOOTHING_WINDOW,
            min_continuity: DEFAULT_MIN_CONTINUITY,
            max_width_ratio: DEFAULT_MAX_WIDTH_RATIO,
            left_search: DEFAULT_LEFT_SEARCH,
            right_search: DEFAULT_RIGHT_SEARCH,
        }
    }
}

impl CoverRegionOptions {
    /// Create a new options builder
    pub fn builder() -> CoverRegionOptionsBuilder {
        CoverRegionOptionsBuilder::default()
    }

    /// Check for values the detector cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.analysis_height < 3 {
            return Err(SpreadError::InvalidOptions(
                "cover region analysis height must be at least 3".to_string(),
            ));
        }
        if self.smoothing_window == 0 {
            return Err(SpreadError::InvalidOptions(
                "cover region smoothing window must be positive".to_string(),
            ));
        }
        for (name, (start, end)) in [("left", self.left_search), ("right", self.right_search)] {
            if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) || start > end {
                return Err(SpreadError::InvalidOptions(format!(
                    "{} search range [{}, {}] must be an ordered range within [0, 1]",
                    name, start, end
                )));
            }
        }
        Ok(())
    }
}

/// Builder for CoverRegionOptions
#[derive(Debug, Default)]
pub struct CoverRegionOptionsBuilder {
    options: CoverRegionOptions,
}

impl CoverRegionOptionsBuilder {
    #[must_use]
    pub fn analysis_height(mut self, height: u32) -> Self {
        self.options.analysis_height = height;
        self
    }

    #[must_use]
    pub fn edge_threshold(mut self, threshold: f64) -> Self {
        self.options.edge_threshold = threshold.max(0.0);
        self
    }

    #[must_use]
    pub fn smoothing_window(mut self, window: usize) -> Self {
        self.options.smoothing_window = window;
        self
    }

    /// Set minimum boundary continuity (clamped to 0.0-1.0)
    #[must_use]
    pub fn min_continuity(mut self, continuity: f64) -> Self {
        self.options.min_continuity = continuity.clamp(0.0, 1.0);
        self
    }

    /// Set maximum kept width ratio (clamped to 0.0-1.0)
    #[must_use]
    pub fn max_width_ratio(mut self, ratio: f64) -> Self {
        self.options.max_width_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn left_search(mut self, start: f64, end: f64) -> Self {
        self.options.left_search = (start.clamp(0.0, 1.0), end.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn right_search(mut self, start: f64, end: f64) -> Self {
        self.options.right_search = (start.clamp(0.0, 1.0), end.clamp(0.0, 1.0));
        self
    }

    #[must_use]
    pub fn build(self) -> CoverRegionOptions {
        self.options
    }
}

// ============================================================
// Results
// ============================================================

/// Strongest continuity column in one search range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundaryPeak {
    /// Column in analysis coordinates
    pub column: u32,
    /// Smoothed continuity at that column
    pub continuity: f64,
    /// Whether the peak cleared the minimum continuity
    pub accepted: bool,
}

/// Why a detection did or did not produce a crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionOutcome {
    /// A frame was found and the crop removes a significant border
    Cropped,
    /// Neither boundary reached the minimum continuity
    NoBoundary,
    /// The crop would keep too much of the width to be worth it
    TooWide,
}

/// Full result of a border detection pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionDetection {
    pub left: BoundaryPeak,
    pub right: BoundaryPeak,
    /// Candidate crop in original coordinates (present unless `NoBoundary`)
    pub candidate: Option<CropRect>,
    /// Kept width fraction of the candidate
    pub width_ratio: Option<f64>,
    pub outcome: RegionOutcome,
}

impl RegionDetection {
    /// The crop to apply, if any
    pub fn crop(&self) -> Option<CropRect> {
        match self.outcome {
            RegionOutcome::Cropped => self.candidate,
            _ => None,
        }
    }
}

// ============================================================
// Detector
// ============================================================

/// Finds the front-cover band inside a wraparound scan
pub struct CoverRegionDetector;

impl CoverRegionDetector {
    /// Detect the cover band of `image`
    pub fn detect(
        image: &DynamicImage,
        options: &CoverRegionOptions,
        filter: ResampleFilter,
    ) -> Result<RegionDetection> {
        let (width, height) = image.dimensions();
        ensure_non_degenerate(width, height)?;

        let buffer = AnalysisBuffer::from_image(image, options.analysis_height, filter)?;
        Ok(Self::detect_buffer(&buffer, options))
    }

    /// Crop `image` to its cover band, or `None` when no border was detected
    pub fn crop_region(
        image: &DynamicImage,
        options: &CoverRegionOptions,
        filter: ResampleFilter,
    ) -> Result<Option<DynamicImage>> {
        let detection = Self::detect(image, options, filter)?;
        Ok(detection.crop().map(|rect| crop(image, &rect)))
    }

    /// Run detection on a prepared analysis buffer
    pub fn detect_buffer(buffer: &AnalysisBuffer, options: &CoverRegionOptions) -> RegionDetection {
        let continuity = Self::column_continuity(buffer, options.edge_threshold);
        let smoothed = smooth(&continuity, options.smoothing_window);

        let left = Self::boundary_peak(buffer, &smoothed, options.left_search, options.min_continuity);
        let right =
            Self::boundary_peak(buffer, &smoothed, options.right_search, options.min_continuity);

        debug!(
            "Cover region peaks: left={}({:.3}), right={}({:.3}) (min={})",
            left.column, left.continuity, right.column, right.continuity, options.min_continuity
        );

        if !left.accepted && !right.accepted {
            debug!(
                "No vertical boundary has continuity >= {}, no cover frame detected",
                options.min_continuity
            );
            return RegionDetection {
                left,
                right,
                candidate: None,
                width_ratio: None,
                outcome: RegionOutcome::NoBoundary,
            };
        }

        // a weak boundary falls back to the image edge
        let effective_left = if left.accepted { left.column } else { 0 };
        let effective_right = if right.accepted {
            right.column
        } else {
            buffer.width()
        };

        let original_width = buffer.original_width() as i64;
        let orig_left = buffer
            .to_original_x(effective_left)
            .clamp(0, original_width - 1);
        let orig_right = buffer
            .to_original_x(effective_right)
            .clamp(orig_left + 1, original_width);

        let rect = CropRect {
            x: orig_left as u32,
            width: (orig_right - orig_left) as u32,
            height: buffer.original_height(),
        };
        let width_ratio = rect.width_ratio(buffer.original_width());

        if width_ratio >= options.max_width_ratio {
            debug!(
                "Cover region width ratio {:.3} >= {}, no significant border detected",
                width_ratio, options.max_width_ratio
            );
            return RegionDetection {
                left,
                right,
                candidate: Some(rect),
                width_ratio: Some(width_ratio),
                outcome: RegionOutcome::TooWide,
            };
        }

        info!(
            "Cropping cover region: x={}..{}, width={} from {} (width ratio: {:.2})",
            rect.x,
            rect.right(),
            rect.width,
            buffer.original_width(),
            width_ratio
        );

        RegionDetection {
            left,
            right,
            candidate: Some(rect),
            width_ratio: Some(width_ratio),
            outcome: RegionOutcome::Cropped,
        }
    }

    /// Fraction of rows per column whose horizontal gradient exceeds `threshold`.
    ///
    /// Border rows and columns are skipped, but the fraction is taken over the
    /// full buffer height.
    pub fn column_continuity(buffer: &AnalysisBuffer, threshold: f64) -> Vec<f64> {
        let (width, height) = (buffer.width(), buffer.height());
        let mut continuity = vec![0.0f64; width as usize];
        if width < 3 || height < 3 {
            return continuity;
        }

        let luma = buffer.luma();
        for x in 1..width - 1 {
            let count = (1..height - 1)
                .filter(|&y| luma.horizontal_gradient(x, y) > threshold)
                .count();
            continuity[x as usize] = count as f64 / height as f64;
        }
        continuity
    }

    fn boundary_peak(
        buffer: &AnalysisBuffer,
        smoothed: &[f64],
        range: (f64, f64),
        min_continuity: f64,
    ) -> BoundaryPeak {
        let start = buffer.column_at(range.0) as usize;
        let end = buffer.column_at(range.1) as usize;
        let (column, continuity) = find_peak(smoothed, start, end, 0.0);
        BoundaryPeak {
            column: column as u32,
            continuity,
            accepted: continuity >= min_continuity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Wraparound scan: back | spine | front | flap | margin
    fn wraparound(width: u32, height: u32) -> RgbImage {
        let bands = [
            (0.20, [200u8, 190, 170]),
            (0.2333, [40, 30, 30]),
            (0.5667, [230, 60, 40]),
            (0.80, [245, 240, 230]),
            (1.0, [120, 120, 120]),
        ];
        RgbImage::from_fn(width, height, |x, _| {
            let r = x as f64 / width as f64;
            let color = bands
                .iter()
                .find(|(end, _)| r < *end)
                .map(|(_, c)| *c)
                .unwrap_or([120, 120, 120]);
            Rgb(color)
        })
    }

    fn buffer(img: RgbImage) -> AnalysisBuffer {
        let h = img.height();
        AnalysisBuffer::from_image(&DynamicImage::ImageRgb8(img), h, ResampleFilter::Nearest).unwrap()
    }

    #[test]
    fn test_default_options() {
        let opts = CoverRegionOptions::default();
        assert_eq!(opts.analysis_height, 400);
        assert_eq!(opts.edge_threshold, 30.0);
        assert_eq!(opts.smoothing_window, 3);
        assert_eq!(opts.min_continuity, 0.15);
        assert_eq!(opts.max_width_ratio, 0.85);
        assert_eq!(opts.left_search, (0.05, 0.45));
        assert_eq!(opts.right_search, (0.55, 0.95));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_builder_clamping_and_validation() {
        let opts = CoverRegionOptions::builder()
            .min_continuity(2.0)
            .max_width_ratio(-1.0)
            .edge_threshold(-5.0)
            .build();
        assert_eq!(opts.min_continuity, 1.0);
        assert_eq!(opts.max_width_ratio, 0.0);
        assert_eq!(opts.edge_threshold, 0.0);

        let bad = CoverRegionOptions::builder().left_search(0.5, 0.1).build();
        assert!(bad.validate().is_err());
        let bad = CoverRegionOptions::builder().smoothing_window(0).build();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_continuity_of_full_height_line() {
        let img = RgbImage::from_fn(20, 10, |x, _| {
            if x == 10 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let continuity = CoverRegionDetector::column_continuity(&buffer(img), 30.0);
        assert_eq!(continuity.len(), 20);
        // rows 1..9 counted, divided by 10
        assert!((continuity[9] - 0.8).abs() < 1e-12);
        assert!((continuity[11] - 0.8).abs() < 1e-12);
        assert_eq!(continuity[10], 0.0);
        assert_eq!(continuity[0], 0.0);
        assert_eq!(continuity[19], 0.0);
    }

    #[test]
    fn test_continuity_respects_threshold() {
        let img = RgbImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Rgb([100, 100, 100])
            } else {
                Rgb([120, 120, 120])
            }
        });
        let continuity = CoverRegionDetector::column_continuity(&buffer(img), 30.0);
        assert!(continuity.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_uniform_image_has_no_boundary() {
        let buf = buffer(RgbImage::from_pixel(600, 400, Rgb([90, 100, 110])));
        let detection = CoverRegionDetector::detect_buffer(&buf, &CoverRegionOptions::default());
        assert_eq!(detection.outcome, RegionOutcome::NoBoundary);
        assert!(detection.crop().is_none());
        assert!(detection.candidate.is_none());
    }

    #[test]
    fn test_wraparound_is_cropped() {
        let buf = buffer(wraparound(1000, 400));
        let detection = CoverRegionDetector::detect_buffer(&buf, &CoverRegionOptions::default());
        assert_eq!(detection.outcome, RegionOutcome::Cropped);
        assert!(detection.left.accepted);
        assert!(detection.right.accepted);

        let rect = detection.crop().unwrap();
        assert_eq!(rect.height, 400);
        assert!(rect.width < 850);
        // left boundary on the back/spine or spine/front line
        assert!((195..=240).contains(&rect.x), "left at {}", rect.x);
        // right boundary on the front/flap or flap/margin line
        assert!((560..=805).contains(&rect.right()), "right at {}", rect.right());
    }

    #[test]
    fn test_single_boundary_falls_back_to_edge() {
        // one strong line at 30%, nothing on the right
        let img = RgbImage::from_fn(1000, 400, |x, _| {
            if x < 300 {
                Rgb([20, 20, 20])
            } else {
                Rgb([220, 220, 220])
            }
        });
        let detection =
            CoverRegionDetector::detect_buffer(&buffer(img), &CoverRegionOptions::default());
        assert!(detection.left.accepted);
        assert!(!detection.right.accepted);
        assert_eq!(detection.outcome, RegionOutcome::Cropped);

        let rect = detection.crop().unwrap();
        assert_eq!(rect.right(), 1000);
        assert!((298..=301).contains(&rect.x), "left at {}", rect.x);
    }

    #[test]
    fn test_single_right_boundary_falls_back_to_left_edge() {
        // one strong line at 70%, nothing on the left
        let img = RgbImage::from_fn(1000, 400, |x, _| {
            if x < 700 {
                Rgb([220, 220, 220])
            } else {
                Rgb([20, 20, 20])
            }
        });
        let detection =
            CoverRegionDetector::detect_buffer(&buffer(img), &CoverRegionOptions::default());
        assert!(!detection.left.accepted);
        assert!(detection.right.accepted);
        assert_eq!(detection.outcome, RegionOutcome::Cropped);

        let rect = detection.crop().unwrap();
        assert_eq!(rect.x, 0);
        assert_eq!(rect.height, 400);
        assert!((698..=701).contains(&rect.right()), "right at {}", rect.right());
    }

    #[test]
    fn test_wide_crop_rejected() {
        // a line at 10% leaves 90% of the width
        let img = RgbImage::from_fn(1000, 400, |x, _| {
            if x < 100 {
                Rgb([20, 20, 20])
            } else {
                Rgb([220, 220, 220])
            }
        });
        let detection =
            CoverRegionDetector::detect_buffer(&buffer(img), &CoverRegionOptions::default());
        assert_eq!(detection.outcome, RegionOutcome::TooWide);
        assert!(detection.width_ratio.unwrap() >= 0.85);
        assert!(detection.crop().is_none());
    }

    #[test]
    fn test_thin_frame_lines_survive_either_filter() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(3000, 1200, |x, _| {
            if (600..606).contains(&x) || (2400..2406).contains(&x) {
                Rgb([10, 10, 10])
            } else {
                Rgb([235, 235, 235])
            }
        }));
        let options = CoverRegionOptions::default();
        let nearest =
            CoverRegionDetector::detect(&image, &options, ResampleFilter::Nearest).unwrap();
        let triangle =
            CoverRegionDetector::detect(&image, &options, ResampleFilter::Triangle).unwrap();

        assert_eq!(nearest.outcome, RegionOutcome::Cropped);
        assert_eq!(triangle.outcome, RegionOutcome::Cropped);
        let (a, b) = (nearest.crop().unwrap(), triangle.crop().unwrap());
        assert!(a.x.abs_diff(b.x) <= 6, "left {} vs {}", a.x, b.x);
        assert!(a.right().abs_diff(b.right()) <= 6, "right {} vs {}", a.right(), b.right());
    }

    #[test]
    fn test_crop_region_keeps_full_height() {
        let image = DynamicImage::ImageRgb8(wraparound(1500, 600));
        let cropped = CoverRegionDetector::crop_region(
            &image,
            &CoverRegionOptions::default(),
            ResampleFilter::Triangle,
        )
        .unwrap()
        .expect("border expected");
        assert_eq!(cropped.height(), 600);
        assert!(cropped.width() < 1275);
    }
}
