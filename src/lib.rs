//! spreadcut - double-page spread splitting and cover cropping
//!
//! Finds the binding seam of scanned two-page spreads, splits them into single
//! pages, decides which half of a cover spread is the front cover, and crops
//! wraparound cover scans down to the front cover band.
//!
//! # Example
//!
//! ```rust,no_run
//! use spreadcut::{Side, SpreadAnalyzer};
//!
//! let image = image::open("spread.png").unwrap();
//! let analyzer = SpreadAnalyzer::default();
//!
//! if analyzer.is_double_page(&image) {
//!     let cover = analyzer.classify_cover_side(&image).unwrap();
//!     let page = analyzer.split_spread(&image, cover).unwrap();
//!     page.save("cover.png").unwrap();
//! }
//!
//! if let Some(front) = analyzer.detect_cover_region(&image).unwrap() {
//!     front.save("front.png").unwrap();
//! }
//! # let _ = Side::Left;
//! ```

pub mod analyzer;
pub mod annotate;
pub mod batch;
pub mod cli;
pub mod codec;
pub mod config;
pub mod cover_region;
pub mod cover_side;
pub mod progress;
pub mod sampler;
pub mod seam;
pub mod signal;
pub mod split;
pub mod types;

// Core types
pub use types::{CropRect, Result, Side, SpreadError};

// Sampling
pub use sampler::{luminance, AnalysisBuffer, LumaPlane, ResampleFilter};

// Seam detection
pub use seam::{
    ColumnProfile, SeamDetector, SeamOptions, SeamOptionsBuilder, SeamResult, SeamSignals,
    SearchWindow,
};

// Splitting
pub use split::{is_double_page, PageSplitter, SplitPlan};

// Cover side
pub use cover_side::{CoverSideClassifier, CoverSideOptions, CoverSideScores, HalfComplexity};

// Cover region
pub use cover_region::{
    BoundaryPeak, CoverRegionDetector, CoverRegionOptions, CoverRegionOptionsBuilder,
    RegionDetection, RegionOutcome,
};

// Codec
pub use codec::OutputFormat;

// Facade
pub use analyzer::{SeamSummary, SpreadAnalyzer, SpreadReport};
pub use annotate::draw_analysis;

// Config
pub use config::{AnalysisOptions, CliOverrides, Config, OutputConfig};

// Batch
pub use batch::{
    BatchAction, BatchItem, BatchMode, BatchOptions, BatchOptionsBuilder, BatchProcessor,
    BatchSummary, NoopProgress, ProgressCallback,
};
pub use progress::{print_summary, BatchProgress, OutputMode};

// CLI
pub use cli::{
    exit_codes, AnalyzeArgs, BatchArgs, Cli, Commands, CoverRegionArgs, CoverSideArgs, InfoArgs,
    SplitArgs, TuningArgs,
};
