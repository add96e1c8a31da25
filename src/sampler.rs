//! Pixel sampling and analysis buffers
//!
//! Every analysis stage works on a reduced-resolution copy of the input page:
//! the page is resized to a fixed height, converted to RGB, and its BT.601 luma
//! is computed once into a flat plane that the per-column passes then reuse.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::types::{ensure_non_degenerate, Result, SpreadError};

// ============================================================
// Constants
// ============================================================

/// ITU-R BT.601 red weight
pub const LUMA_RED: f64 = 0.299;

/// ITU-R BT.601 green weight
pub const LUMA_GREEN: f64 = 0.587;

/// ITU-R BT.601 blue weight
pub const LUMA_BLUE: f64 = 0.114;

// ============================================================
// Luminance
// ============================================================

/// Perceptual gray value of an RGB triple (0-255 scale)
#[inline]
pub fn luma_of(rgb: [u8; 3]) -> f64 {
    LUMA_RED * rgb[0] as f64 + LUMA_GREEN * rgb[1] as f64 + LUMA_BLUE * rgb[2] as f64
}

/// Perceptual gray value of the pixel at `(x, y)`.
///
/// Panics when the coordinate lies outside the image.
#[inline]
pub fn luminance(image: &RgbImage, x: u32, y: u32) -> f64 {
    luma_of(image.get_pixel(x, y).0)
}

/// Resampling filter used when building analysis buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl ResampleFilter {
    fn filter_type(self) -> FilterType {
        match self {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl std::str::FromStr for ResampleFilter {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "bilinear" => Ok(Self::Triangle),
            "catmull-rom" | "catmullrom" | "bicubic" => Ok(Self::CatmullRom),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            other => Err(SpreadError::InvalidOptions(format!(
                "unknown resample filter '{}'",
                other
            ))),
        }
    }
}

// ============================================================
// Luma plane
// ============================================================

/// Row-major grid of luminance values
#[derive(Debug, Clone)]
pub struct LumaPlane {
    width: u32,
    height: u32,
    data: Vec<f64>,
}

impl LumaPlane {
    /// Compute the luma of every pixel of `image`
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let data = image.pixels().map(|p| luma_of(p.0)).collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luma at `(x, y)`; out-of-bounds access panics
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        assert!(
            x < self.width && y < self.height,
            "luma access ({}, {}) outside {}x{} plane",
            x,
            y,
            self.width,
            self.height
        );
        self.data[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Central horizontal difference `|L(x+1, y) - L(x-1, y)|`.
    ///
    /// Only defined for interior columns `1..width-1`.
    #[inline]
    pub fn horizontal_gradient(&self, x: u32, y: u32) -> f64 {
        (self.get(x + 1, y) - self.get(x - 1, y)).abs()
    }

    /// Mean luminance of every column
    pub fn column_means(&self) -> Vec<f64> {
        let mut sums = vec![0.0f64; self.width as usize];
        for row in self.data.chunks_exact(self.width as usize) {
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += value;
            }
        }
        let height = self.height as f64;
        sums.iter_mut().for_each(|s| *s /= height);
        sums
    }

    /// Mean horizontal gradient of every column; the two border columns are zero
    pub fn column_gradient_means(&self) -> Vec<f64> {
        let mut means = vec![0.0f64; self.width as usize];
        if self.width < 3 {
            return means;
        }
        for x in 1..self.width - 1 {
            let sum: f64 = (0..self.height)
                .map(|y| self.horizontal_gradient(x, y))
                .sum();
            means[x as usize] = sum / self.height as f64;
        }
        means
    }
}

// ============================================================
// Analysis buffer
// ============================================================

/// Downscaled working copy of a page, owned by a single analysis call
#[derive(Debug, Clone)]
pub struct AnalysisBuffer {
    rgb: RgbImage,
    luma: LumaPlane,
    scale: f64,
    original_width: u32,
    original_height: u32,
}

impl AnalysisBuffer {
    /// Resize `image` to `target_height` rows, keeping the aspect ratio.
    ///
    /// The width is rounded to the nearest integer and never drops below one column.
    pub fn from_image(
        image: &DynamicImage,
        target_height: u32,
        filter: ResampleFilter,
    ) -> Result<Self> {
        let (width, height) = image.dimensions();
        ensure_non_degenerate(width, height)?;
        if target_height == 0 {
            return Err(SpreadError::InvalidOptions(
                "analysis height must be positive".to_string(),
            ));
        }

        let scale = target_height as f64 / height as f64;
        let analysis_width = ((width as f64 * scale).round() as u32).max(1);

        let rgb = if (analysis_width, target_height) == (width, height) {
            image.to_rgb8()
        } else {
            image
                .resize_exact(analysis_width, target_height, filter.filter_type())
                .to_rgb8()
        };

        Ok(Self::from_parts(rgb, scale, width, height))
    }

    /// Wrap an already-sized RGB buffer
    pub fn from_parts(rgb: RgbImage, scale: f64, original_width: u32, original_height: u32) -> Self {
        let luma = LumaPlane::from_rgb(&rgb);
        Self {
            rgb,
            luma,
            scale,
            original_width,
            original_height,
        }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// Analysis rows per original row
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn original_width(&self) -> u32 {
        self.original_width
    }

    pub fn original_height(&self) -> u32 {
        self.original_height
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    pub fn luma(&self) -> &LumaPlane {
        &self.luma
    }

    /// Map an analysis column to the nearest original column
    pub fn to_original_x(&self, x: u32) -> i64 {
        (x as f64 / self.scale).round() as i64
    }

    /// Ratio of the analysis width, rounded to the nearest column
    pub fn column_at(&self, ratio: f64) -> u32 {
        (self.width() as f64 * ratio).round() as u32
    }

    /// Iterate `(x, y, rgb)` over the full-height band `columns`
    pub fn band(&self, columns: Range<u32>) -> impl Iterator<Item = (u32, u32, &Rgb<u8>)> + '_ {
        let height = self.height();
        columns.flat_map(move |x| (0..height).map(move |y| (x, y, self.rgb.get_pixel(x, y))))
    }
}
