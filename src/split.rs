//! Double-page detection and spread splitting
//!
//! A spread is recognized by aspect ratio alone. Splitting runs seam detection
//! on a 300 px tall copy, maps the seam back to full resolution and crops one
//! side, keeping the full height.

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::sampler::{AnalysisBuffer, ResampleFilter};
use crate::seam::{SeamDetector, SeamOptions, SeamResult};
use crate::types::{ensure_non_degenerate, CropRect, Result, Side, SpreadError};

/// A page is a spread when it is wider than it is tall
pub fn is_double_page(width: u32, height: u32) -> bool {
    width > height
}

/// Where a spread was cut
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlan {
    /// Seam in analysis coordinates
    pub seam: SeamResult,
    /// Seam in original coordinates, always within `[1, width - 1]`
    pub seam_x: u32,
    /// Crop for the requested side
    pub crop: CropRect,
}

/// Splits spreads into single pages
pub struct PageSplitter;

impl PageSplitter {
    /// Map an analysis seam column to an original column inside `[1, width - 1]`
    pub fn seam_to_original(buffer: &AnalysisBuffer, seam: &SeamResult) -> Result<u32> {
        let width = buffer.original_width();
        if width < 2 {
            return Err(SpreadError::DegenerateGeometry {
                width,
                height: buffer.original_height(),
            });
        }
        let x = buffer.to_original_x(seam.column).clamp(1, width as i64 - 1);
        Ok(x as u32)
    }

    /// Crop rectangle for one side of a seam at original column `seam_x`
    pub fn rect_for_side(seam_x: u32, keep: Side, width: u32, height: u32) -> Result<CropRect> {
        match keep {
            Side::Left => CropRect::new(0, seam_x, height, width),
            Side::Right => CropRect::new(seam_x, width.saturating_sub(seam_x), height, width),
        }
    }

    /// Locate the seam of `image` and plan the crop for `keep`
    pub fn plan(
        image: &DynamicImage,
        keep: Side,
        options: &SeamOptions,
        filter: ResampleFilter,
    ) -> Result<SplitPlan> {
        let (width, height) = image.dimensions();
        ensure_non_degenerate(width, height)?;

        let buffer = AnalysisBuffer::from_image(image, options.analysis_height, filter)?;
        let seam = SeamDetector::detect(&buffer, options);
        let seam_x = Self::seam_to_original(&buffer, &seam)?;
        let crop = Self::rect_for_side(seam_x, keep, width, height)?;

        debug!(
            "Split plan: seam column {} -> x={} of {}, keeping {} ({}px wide)",
            seam.column, seam_x, width, keep, crop.width
        );

        Ok(SplitPlan { seam, seam_x, crop })
    }

    /// Crop the requested side of a spread
    pub fn split(
        image: &DynamicImage,
        keep: Side,
        options: &SeamOptions,
        filter: ResampleFilter,
    ) -> Result<DynamicImage> {
        let plan = Self::plan(image, keep, options, filter)?;
        Ok(crop(image, &plan.crop))
    }
}

/// Copy the full-height band described by `rect` out of `image`
pub fn crop(image: &DynamicImage, rect: &CropRect) -> DynamicImage {
    image.crop_imm(rect.x, 0, rect.width, rect.height)
}
