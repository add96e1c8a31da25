//! Seam Detection module
//!
//! Finds the vertical line separating the two pages of a double-page spread.
//!
//! # Algorithm
//!
//! 1. Average luminance and horizontal gradient per column of the analysis buffer
//! 2. Smooth the brightness series (window 5)
//! 3. For each column in the search window (35%-65% of the width) combine
//!    brightness transition (x2.0), normalized edge strength (x1.0) and
//!    variance change (x1.5) between the 30 columns on either side
//! 4. Keep the first column with the highest score, or the window midpoint
//!    when nothing scores above zero
//!
//! # Example
//!
//! ```rust,no_run
//! use spreadcut::{AnalysisBuffer, ResampleFilter, SeamDetector, SeamOptions};
//!
//! let page = image::open("spread.png").unwrap();
//! let options = SeamOptions::default();
//! let buffer =
//!     AnalysisBuffer::from_image(&page, options.analysis_height, ResampleFilter::Triangle).unwrap();
//! let seam = SeamDetector::detect(&buffer, &options);
//! println!("seam column {} (score {:.2})", seam.column, seam.score);
//! ```

mod detect;
mod types;

pub use detect::{ColumnProfile, SeamDetector};
pub use types::{
    SeamOptions, SeamOptionsBuilder, SeamResult, SeamSignals, SearchWindow,
    DEFAULT_SEAM_ANALYSIS_HEIGHT,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = SeamOptions::default();
        assert_eq!(opts.analysis_height, 300);
        assert_eq!(opts.search_start, 0.35);
        assert_eq!(opts.search_end, 0.65);
        assert_eq!(opts.smoothing_window, 5);
        assert_eq!(opts.context_width, 30);
        assert_eq!(opts.brightness_weight, 2.0);
        assert_eq!(opts.edge_weight, 1.0);
        assert_eq!(opts.variance_weight, 1.5);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let opts = SeamOptions::builder()
            .analysis_height(200)
            .search_window(0.4, 0.6)
            .smoothing_window(3)
            .context_width(20)
            .weights(1.0, 2.0, 0.5)
            .build();

        assert_eq!(opts.analysis_height, 200);
        assert_eq!(opts.search_start, 0.4);
        assert_eq!(opts.search_end, 0.6);
        assert_eq!(opts.smoothing_window, 3);
        assert_eq!(opts.context_width, 20);
        assert_eq!(opts.edge_weight, 2.0);
    }

    #[test]
    fn test_builder_clamping() {
        let opts = SeamOptions::builder().search_window(-0.5, 1.5).build();
        assert_eq!(opts.search_start, 0.0);
        assert_eq!(opts.search_end, 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let inverted = SeamOptions::builder().search_window(0.7, 0.3).build();
        assert!(inverted.validate().is_err());

        let zero_height = SeamOptions::builder().analysis_height(0).build();
        assert!(zero_height.validate().is_err());

        let zero_window = SeamOptions::builder().smoothing_window(0).build();
        assert!(zero_window.validate().is_err());
    }

    #[test]
    fn test_search_window_from_ratios() {
        let window = SearchWindow::from_ratios(400, 0.35, 0.65);
        assert_eq!(window, SearchWindow { start: 140, end: 260 });
        assert_eq!(window.midpoint(), 200);
        assert!(!window.is_degenerate());

        // clipped to the last column
        let window = SearchWindow::from_ratios(10, 0.5, 1.0);
        assert_eq!(window.end, 9);
    }
}
