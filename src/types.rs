//! Common types shared by every analysis stage

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Spread analysis error types
#[derive(Debug, Error)]
pub enum SpreadError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Degenerate image geometry: {width}x{height}")]
    DegenerateGeometry { width: u32, height: u32 },

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpreadError>;

/// Reject images that have no pixels along either axis
pub(crate) fn ensure_non_degenerate(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(SpreadError::DegenerateGeometry { width, height });
    }
    Ok(())
}

/// Left or right half of a spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The opposite half
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Lowercase name, also used as an output file suffix
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Side::Left),
            "right" | "r" => Ok(Side::Right),
            other => Err(SpreadError::InvalidOptions(format!(
                "unknown side '{}', expected left or right",
                other
            ))),
        }
    }
}

/// Horizontal crop in original-resolution coordinates.
///
/// Height is never cropped by these operations, so the rectangle always spans
/// the full original height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Build a crop, rejecting empty or out-of-bounds rectangles
    pub fn new(x: u32, width: u32, height: u32, image_width: u32) -> Result<Self> {
        if width == 0 || height == 0 || x.saturating_add(width) > image_width {
            return Err(SpreadError::DegenerateGeometry { width, height });
        }
        Ok(Self { x, width, height })
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Fraction of the original width kept by this crop
    pub fn width_ratio(&self, image_width: u32) -> f64 {
        if image_width == 0 {
            return 0.0;
        }
        self.width as f64 / image_width as f64
    }
}
