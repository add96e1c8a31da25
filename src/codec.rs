//! Decoding, encoding and header probing
//!
//! Analysis works on decoded buffers only; this module is the boundary where
//! bytes become pixels and pixels become bytes again.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{ensure_non_degenerate, Result, SpreadError};

/// Output container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// Whether the container can store an alpha channel
    pub fn supports_transparency(self) -> bool {
        matches!(self, OutputFormat::Png)
    }

    /// Guess from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
            .ok_or_else(|| SpreadError::InvalidOptions(format!("unsupported output format '{}'", s)))
    }
}

/// Decode image bytes, guessing the format from magic bytes
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes).map_err(|e| SpreadError::Decode(e.to_string()))?;
    ensure_non_degenerate(image.width(), image.height())?;
    Ok(image)
}

/// Read and decode an image file
pub fn open(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(SpreadError::ImageNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Encode `image` into `format`.
///
/// Formats without transparency get the image composited onto white first.
pub fn encode(image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
    let image: Cow<'_, DynamicImage> = if !format.supports_transparency() && contains_alpha_channel(image) {
        Cow::Owned(DynamicImage::ImageRgb8(flatten_onto_white(image)))
    } else {
        Cow::Borrowed(image)
    };

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format.image_format())
        .map_err(|e| SpreadError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Read `(width, height)` from the header without decoding pixels
pub fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

pub fn contains_alpha_channel(image: &DynamicImage) -> bool {
    image.color().has_alpha()
}

/// True when at least one pixel is fully transparent
pub fn contains_transparency(image: &DynamicImage) -> bool {
    contains_alpha_channel(image) && image.to_rgba8().pixels().any(|p| p.0[3] == 0)
}

/// Composite onto an opaque white background
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Re-encode image bytes into `format`
pub fn convert(bytes: &[u8], format: OutputFormat) -> Result<Vec<u8>> {
    let image = decode(bytes)?;

    if !format.supports_transparency() && contains_alpha_channel(&image) {
        if contains_transparency(&image) {
            info!("Image contains alpha channel but is not opaque, visual artifacts may appear");
        } else {
            info!("Image contains alpha channel but is opaque, conversion should not generate any visual artifacts");
        }
    }

    encode(&image, format)
}

/// Shrink an image to fit a `size` x `size` box, never upscaling.
///
/// Returns the input untouched when it is already in `format` and fits.
pub fn resize_to_fit(bytes: &[u8], format: OutputFormat, size: u32) -> Result<Vec<u8>> {
    let longest_edge = dimensions(bytes).map(|(w, h)| w.max(h));

    if let Some(longest) = longest_edge {
        let same_format = image::guess_format(bytes).ok() == Some(format.image_format());
        if same_format && longest <= size {
            debug!("Skipping resize: {}px already fits {}px", longest, size);
            return Ok(bytes.to_vec());
        }
    }

    let target = longest_edge.map_or(size, |longest| longest.min(size));
    let image = decode(bytes)?;
    let resized = if image.width().max(image.height()) > target {
        image.resize(target, target, FilterType::Lanczos3)
    } else {
        image
    };
    encode(&resized, format)
}
