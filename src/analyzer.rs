//! Caller-facing facade over the analysis stages
//!
//! [`SpreadAnalyzer`] bundles the options of every stage and exposes the
//! page-level operations on decoded images, plus byte-level variants that
//! decode their input and return PNG output.

use image::{DynamicImage, GenericImageView};
use serde::Serialize;

use crate::codec::{self, OutputFormat};
use crate::config::AnalysisOptions;
use crate::cover_region::{CoverRegionDetector, RegionDetection};
use crate::cover_side::{CoverSideClassifier, CoverSideScores};
use crate::sampler::AnalysisBuffer;
use crate::seam::SeamDetector;
use crate::split::{crop, is_double_page, PageSplitter};
use crate::types::{ensure_non_degenerate, Result, Side};

/// Seam summary in both coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeamSummary {
    /// Column in the analysis buffer
    pub column: u32,
    pub score: f64,
    /// Column in the original image
    pub x: u32,
    pub analysis_width: u32,
}

/// Everything known about one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadReport {
    pub width: u32,
    pub height: u32,
    pub is_double_page: bool,
    pub seam: SeamSummary,
    pub cover_side: CoverSideScores,
    pub cover_region: RegionDetection,
}

/// Spread analysis entry point
#[derive(Debug, Clone, Default)]
pub struct SpreadAnalyzer {
    options: AnalysisOptions,
}

impl SpreadAnalyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Aspect-ratio test on the original image
    pub fn is_double_page(&self, image: &DynamicImage) -> bool {
        let (width, height) = image.dimensions();
        is_double_page(width, height)
    }

    /// Header-only variant; unreadable headers are not spreads
    pub fn is_double_page_bytes(&self, bytes: &[u8]) -> bool {
        codec::dimensions(bytes).is_some_and(|(width, height)| is_double_page(width, height))
    }

    /// Crop one page out of a spread
    pub fn split_spread(&self, image: &DynamicImage, keep: Side) -> Result<DynamicImage> {
        PageSplitter::split(image, keep, &self.options.seam, self.options.resample)
    }

    /// Which half of a spread is the front cover
    pub fn classify_cover_side(&self, image: &DynamicImage) -> Result<Side> {
        CoverSideClassifier::classify(
            image,
            &self.options.seam,
            &self.options.cover_side,
            self.options.resample,
        )
    }

    /// The front-cover band of a wraparound scan, `None` when no border is found
    pub fn detect_cover_region(&self, image: &DynamicImage) -> Result<Option<DynamicImage>> {
        CoverRegionDetector::crop_region(image, &self.options.cover_region, self.options.resample)
    }

    /// Border detection details without cropping
    pub fn cover_region_details(&self, image: &DynamicImage) -> Result<RegionDetection> {
        CoverRegionDetector::detect(image, &self.options.cover_region, self.options.resample)
    }

    /// Run every stage and collect the results
    pub fn analyze(&self, image: &DynamicImage) -> Result<SpreadReport> {
        let (width, height) = image.dimensions();
        ensure_non_degenerate(width, height)?;

        // seam and cover side share the same analysis buffer
        let buffer =
            AnalysisBuffer::from_image(image, self.options.seam.analysis_height, self.options.resample)?;
        let seam = SeamDetector::detect(&buffer, &self.options.seam);
        let seam_x = if width >= 2 {
            PageSplitter::seam_to_original(&buffer, &seam)?
        } else {
            0
        };
        let cover_side = CoverSideClassifier::score_buffer(&buffer, seam, &self.options.cover_side);
        let cover_region = self.cover_region_details(image)?;

        Ok(SpreadReport {
            width,
            height,
            is_double_page: is_double_page(width, height),
            seam: SeamSummary {
                column: seam.column,
                score: seam.score,
                x: seam_x,
                analysis_width: buffer.width(),
            },
            cover_side,
            cover_region,
        })
    }

    /// Decode, split and re-encode as PNG
    pub fn crop_double_page(&self, bytes: &[u8], keep: Side) -> Result<Vec<u8>> {
        let image = codec::decode(bytes)?;
        let page = self.split_spread(&image, keep)?;
        codec::encode(&page, OutputFormat::Png)
    }

    /// Decode and classify
    pub fn detect_cover_side(&self, bytes: &[u8]) -> Result<Side> {
        let image = codec::decode(bytes)?;
        self.classify_cover_side(&image)
    }

    /// Decode, crop the cover band and re-encode as PNG
    pub fn crop_cover_region(&self, bytes: &[u8]) -> Result<Option<Vec<u8>>> {
        let image = codec::decode(bytes)?;
        let detection = self.cover_region_details(&image)?;
        detection
            .crop()
            .map(|rect| codec::encode(&crop(&image, &rect), OutputFormat::Png))
            .transpose()
    }
}
