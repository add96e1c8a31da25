//! Seam detection types and options

use serde::{Deserialize, Serialize};

use crate::types::{Result, SpreadError};

// ============================================================
// Constants
// ============================================================

/// Analysis buffer height for seam and cover-side detection
pub const DEFAULT_SEAM_ANALYSIS_HEIGHT: u32 = 300;

/// Search window start as a fraction of the analysis width
pub const DEFAULT_SEARCH_START: f64 = 0.35;

/// Search window end as a fraction of the analysis width
pub const DEFAULT_SEARCH_END: f64 = 0.65;

/// Moving-average window applied to column brightness
pub const DEFAULT_SEAM_SMOOTHING_WINDOW: usize = 5;

/// Columns compared on each side of a candidate
pub const DEFAULT_CONTEXT_WIDTH: usize = 30;

/// Weight of the brightness discontinuity signal
pub const DEFAULT_BRIGHTNESS_WEIGHT: f64 = 2.0;

/// Weight of the normalized edge signal
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Weight of the variance change signal
pub const DEFAULT_VARIANCE_WEIGHT: f64 = 1.5;

/// Lower bound for the edge normalizer, avoids dividing by zero on flat pages
pub const MIN_EDGE_NORMALIZER: f64 = 1.0;

// ============================================================
// Options
// ============================================================

/// Seam detection options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeamOptions {
    /// Height of the downscaled analysis buffer
    pub analysis_height: u32,
    /// Search window start (fraction of width)
    pub search_start: f64,
    /// Search window end (fraction of width)
    pub search_end: f64,
    /// Brightness smoothing window
    pub smoothing_window: usize,
    /// Context columns on each side of a candidate
    pub context_width: usize,
    pub brightness_weight: f64,
    pub edge_weight: f64,
    pub variance_weight: f64,
}

impl Default for SeamOptions {
    fn default() -> Self {
        Self {
            analysis_height: DEFAULT_SEAM_ANALYSIS_HEIGHT,
            search_start: DEFAULT_SEARCH_START,
            search_end: DEFAULT_SEARCH_END,
            smoothing_window: DEFAULT_SEAM_SMOOTHING_WINDOW,
            context_width: DEFAULT_CONTEXT_WIDTH,
            brightness_weight: DEFAULT_BRIGHTNESS_WEIGHT,
            edge_weight: DEFAULT_EDGE_WEIGHT,
            variance_weight: DEFAULT_VARIANCE_WEIGHT,
        }
    }
}

impl SeamOptions {
    /// Create a new options builder
    pub fn builder() -> SeamOptionsBuilder {
        SeamOptionsBuilder::default()
    }

    /// Check for values the detector cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.analysis_height == 0 {
            return Err(SpreadError::InvalidOptions(
                "seam analysis height must be positive".to_string(),
            ));
        }
        if self.smoothing_window == 0 {
            return Err(SpreadError::InvalidOptions(
                "seam smoothing window must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.search_start)
            || !(0.0..=1.0).contains(&self.search_end)
            || self.search_start > self.search_end
        {
            return Err(SpreadError::InvalidOptions(format!(
                "seam search window [{}, {}] must be an ordered range within [0, 1]",
                self.search_start, self.search_end
            )));
        }
        Ok(())
    }
}

/// Builder for SeamOptions
#[derive(Debug, Default)]
pub struct SeamOptionsBuilder {
    options: SeamOptions,
}

impl SeamOptionsBuilder {
    #[must_use]
    pub fn analysis_height(mut self, height: u32) -> Self {
        self.options.analysis_height = height;
        self
    }

    /// Set the search window as fractions of the width (clamped to 0.0-1.0)
    #[must_use]
    pub fn search_window(mut self, start: f64, end: f64) -> Self {
        self.options.search_start = start.clamp(0.0, 1.0);
        self.options.search_end = end.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn smoothing_window(mut self, window: usize) -> Self {
        self.options.smoothing_window = window;
        self
    }

    #[must_use]
    pub fn context_width(mut self, width: usize) -> Self {
        self.options.context_width = width;
        self
    }

    /// Set brightness / edge / variance weights
    #[must_use]
    pub fn weights(mut self, brightness: f64, edge: f64, variance: f64) -> Self {
        self.options.brightness_weight = brightness;
        self.options.edge_weight = edge;
        self.options.variance_weight = variance;
        self
    }

    #[must_use]
    pub fn build(self) -> SeamOptions {
        self.options
    }
}

// ============================================================
// Results
// ============================================================

/// Closed column range `[start, end]` searched for the seam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    pub start: u32,
    pub end: u32,
}

impl SearchWindow {
    /// Window from width fractions, rounded to the nearest column and clipped
    /// to the last column
    pub fn from_ratios(width: u32, start: f64, end: f64) -> Self {
        let last = width.saturating_sub(1);
        let start = ((width as f64 * start).round() as u32).min(last);
        let end = ((width as f64 * end).round() as u32).min(last);
        Self { start, end }
    }

    pub fn midpoint(&self) -> u32 {
        (self.start + self.end) / 2
    }

    /// An inverted window has nothing to search
    pub fn is_degenerate(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, column: u32) -> bool {
        column >= self.start && column <= self.end
    }
}

/// Detected seam in analysis-buffer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeamResult {
    /// Column of the seam
    pub column: u32,
    /// Composite score at that column (0.0 when falling back to the midpoint)
    pub score: f64,
    /// Window that was searched
    pub window: SearchWindow,
}

impl SeamResult {
    /// True when no column produced a positive score
    pub fn is_fallback(&self) -> bool {
        self.score <= 0.0
    }
}

/// Per-candidate signal breakdown
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SeamSignals {
    pub brightness_transition: f64,
    pub edge_score: f64,
    pub variance_change: f64,
}

impl SeamSignals {
    /// Weighted composite score
    pub fn composite(&self, options: &SeamOptions) -> f64 {
        self.brightness_transition * options.brightness_weight
            + self.edge_score * options.edge_weight
            + self.variance_change * options.variance_weight
    }
}
