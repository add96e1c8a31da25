//! Progress display for batch runs.
//!
//! Wraps an `indicatif` bar that worker threads advance through
//! [`ProgressCallback`], plus the end-of-run summary.

use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::{BatchAction, BatchItem, BatchSummary, ProgressCallback};

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No output
    Quiet,
    /// Progress bar and summary
    #[default]
    Normal,
    /// Also one line per finished item
    Verbose,
}

impl OutputMode {
    /// Create OutputMode from verbosity level
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => OutputMode::Normal,
            _ => OutputMode::Verbose,
        }
    }

    /// Check if output should be shown at this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, _) => true,
            _ => false,
        }
    }
}

/// Bar template
const PROGRESS_TEMPLATE: &str = "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}";

/// Progress bar fed by batch workers
pub struct BatchProgress {
    bar: ProgressBar,
    mode: OutputMode,
}

impl BatchProgress {
    pub fn new(total: usize, mode: OutputMode) -> Self {
        let bar = if mode.should_show(OutputMode::Normal) {
            ProgressBar::new(total as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar, mode }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for BatchProgress {
    fn on_item_complete(&self, item: &BatchItem) {
        self.bar.inc(1);
        if self.mode.should_show(OutputMode::Verbose) {
            self.bar.println(describe_item(item));
        }
    }
}

/// One-line description of a finished item
pub fn describe_item(item: &BatchItem) -> String {
    let name = item.input.display();
    match (&item.action, &item.error) {
        (_, Some(error)) => format!("  FAIL {}: {}", name, error),
        (BatchAction::Split { kept }, _) => format!("  OK   {} (kept {})", name, kept),
        (BatchAction::SplitBoth, _) => format!("  OK   {} (split)", name),
        (BatchAction::CoverCropped, _) => format!("  OK   {} (cover cropped)", name),
        (BatchAction::PassThrough, _) => format!("  OK   {} (unchanged)", name),
        (BatchAction::Failed, None) => format!("  FAIL {}", name),
    }
}

/// Print final summary
pub fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", "=".repeat(60));
    println!("Batch Summary");
    println!("{}", "=".repeat(60));
    println!("  Total files:  {}", summary.total());
    println!("  Succeeded:    {}", summary.succeeded());
    println!("  Unchanged:    {}", summary.passed_through());
    println!("  Errors:       {}", summary.failed());
    println!("{}", "=".repeat(60));
}
