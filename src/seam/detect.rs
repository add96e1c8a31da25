//! Seam search over column statistics

use tracing::debug;

use super::types::{SeamOptions, SeamResult, SeamSignals, SearchWindow, MIN_EDGE_NORMALIZER};
use crate::sampler::AnalysisBuffer;
use crate::signal::{smooth, variance_inclusive, window_mean};

/// Per-column statistics of an analysis buffer
#[derive(Debug, Clone)]
pub struct ColumnProfile {
    /// Mean luminance per column
    pub brightness: Vec<f64>,
    /// Brightness after the moving average
    pub smoothed: Vec<f64>,
    /// Mean horizontal gradient per column
    pub edge: Vec<f64>,
}

impl ColumnProfile {
    /// Compute brightness and edge series for every column of `buffer`
    pub fn from_buffer(buffer: &AnalysisBuffer, smoothing_window: usize) -> Self {
        let brightness = buffer.luma().column_means();
        let edge = buffer.luma().column_gradient_means();
        let smoothed = smooth(&brightness, smoothing_window);
        Self {
            brightness,
            smoothed,
            edge,
        }
    }

    pub fn width(&self) -> usize {
        self.brightness.len()
    }

    /// Largest edge strength inside the window, floored at 1.0
    fn edge_normalizer(&self, window: SearchWindow) -> f64 {
        let start = window.start as usize;
        let end = (window.end as usize).min(self.edge.len().saturating_sub(1));
        self.edge
            .get(start..=end)
            .and_then(|slice| slice.iter().copied().reduce(f64::max))
            .unwrap_or(MIN_EDGE_NORMALIZER)
            .max(MIN_EDGE_NORMALIZER)
    }
}

/// Locates the vertical line separating the two pages of a spread
pub struct SeamDetector;

impl SeamDetector {
    /// Detect the seam inside the configured window of `buffer`
    pub fn detect(buffer: &AnalysisBuffer, options: &SeamOptions) -> SeamResult {
        let window =
            SearchWindow::from_ratios(buffer.width(), options.search_start, options.search_end);
        Self::detect_in_window(buffer, window, options)
    }

    /// Detect the seam inside an explicit column window
    pub fn detect_in_window(
        buffer: &AnalysisBuffer,
        window: SearchWindow,
        options: &SeamOptions,
    ) -> SeamResult {
        if window.is_degenerate() {
            debug!(
                "Degenerate seam window [{}, {}], using midpoint",
                window.start, window.end
            );
            return SeamResult {
                column: window.midpoint(),
                score: 0.0,
                window,
            };
        }

        let profile = ColumnProfile::from_buffer(buffer, options.smoothing_window);
        Self::search(&profile, window, options)
    }

    /// Score every candidate in `window` and keep the first maximum.
    ///
    /// Falls back to the window midpoint when no column scores above zero.
    pub fn search(profile: &ColumnProfile, window: SearchWindow, options: &SeamOptions) -> SeamResult {
        let mut best_score = 0.0f64;
        let mut best_column = window.midpoint();

        if profile.width() == 0 || window.is_degenerate() {
            return SeamResult {
                column: best_column,
                score: best_score,
                window,
            };
        }

        let max_edge = profile.edge_normalizer(window);
        let last = (window.end as usize).min(profile.width() - 1);

        for x in window.start as usize..=last {
            let Some(signals) = Self::signals_at(profile, x, max_edge, options) else {
                continue;
            };
            let score = signals.composite(options);
            if score > best_score {
                best_score = score;
                best_column = x as u32;
            }
        }

        debug!(
            "Seam detected at column {} (score: {:.4}) in range [{}, {}]",
            best_column, best_score, window.start, window.end
        );

        SeamResult {
            column: best_column,
            score: best_score,
            window,
        }
    }

    /// The three seam signals at column `x`.
    ///
    /// `None` when either context window is empty (first or last column, or a
    /// zero context width); such a column can never be the seam.
    pub fn signals_at(
        profile: &ColumnProfile,
        x: usize,
        max_edge: f64,
        options: &SeamOptions,
    ) -> Option<SeamSignals> {
        let smoothed = &profile.smoothed;
        let last = smoothed.len().saturating_sub(1);
        let ctx = options.context_width;

        if ctx == 0 || x == 0 || x >= last {
            return None;
        }

        let left_from = x.saturating_sub(ctx);
        let right_to = (x + ctx).min(last);

        // left context is [x - ctx, x), right context is [x + 1, x + ctx]
        let left_mean = window_mean(smoothed, left_from, x);
        let right_mean = window_mean(smoothed, x + 1, right_to + 1);
        let brightness_transition = (right_mean - left_mean).abs();

        let edge_score = profile.edge[x] / max_edge.max(MIN_EDGE_NORMALIZER);

        let left_variance = variance_inclusive(smoothed, left_from, x);
        let right_variance = variance_inclusive(smoothed, x + 1, right_to);
        let variance_change = (left_variance - right_variance).abs();

        Some(SeamSignals {
            brightness_transition,
            edge_score,
            variance_change,
        })
    }
}
