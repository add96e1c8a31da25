//! Batch processing module
//!
//! Shards a list of page images across a rayon pool. Every item is decoded,
//! analyzed and written on its own; a failing item is recorded and logged but
//! never aborts the rest of the batch.

use image::DynamicImage;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::analyzer::SpreadAnalyzer;
use crate::codec::{self, OutputFormat};
use crate::types::{Result, Side, SpreadError};

/// File extensions picked up when scanning a directory
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff"];

/// What to do with every spread in the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BatchMode {
    /// Keep one half of every spread
    SplitSpread { keep: Side },
    /// Write both halves as `<stem>_left` / `<stem>_right`
    SplitBoth,
    /// Keep the half detected as front cover
    CoverSide,
    /// Crop wraparound covers to the front cover band
    CoverRegion,
}

impl std::fmt::Display for BatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchMode::SplitSpread { keep } => write!(f, "split-{}", keep),
            BatchMode::SplitBoth => write!(f, "split-both"),
            BatchMode::CoverSide => write!(f, "cover-side"),
            BatchMode::CoverRegion => write!(f, "cover-region"),
        }
    }
}

impl std::str::FromStr for BatchMode {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "split-left" => Ok(BatchMode::SplitSpread { keep: Side::Left }),
            "split-right" => Ok(BatchMode::SplitSpread { keep: Side::Right }),
            "split-both" => Ok(BatchMode::SplitBoth),
            "cover-side" => Ok(BatchMode::CoverSide),
            "cover-region" => Ok(BatchMode::CoverRegion),
            other => Err(SpreadError::InvalidOptions(format!(
                "unknown batch mode '{}'",
                other
            ))),
        }
    }
}

/// What happened to one input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    /// One half was kept
    Split { kept: Side },
    /// Both halves were written
    SplitBoth,
    /// The cover band was cropped out
    CoverCropped,
    /// Written unchanged (single page, or no cover frame found)
    PassThrough,
    /// Processing failed, see `error`
    Failed,
}

/// Outcome for one input file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub input: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub action: BatchAction,
    pub error: Option<String>,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn failed(input: &Path, error: &SpreadError) -> Self {
        Self {
            input: input.to_path_buf(),
            outputs: Vec::new(),
            action: BatchAction::Failed,
            error: Some(error.to_string()),
        }
    }
}

/// Results of a whole batch, in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub items: Vec<BatchItem>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Items written unchanged
    pub fn passed_through(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.action == BatchAction::PassThrough)
            .count()
    }
}

/// Receives per-item notifications from worker threads
pub trait ProgressCallback: Sync {
    /// Called once per item, in completion order
    fn on_item_complete(&self, _item: &BatchItem) {}
}

/// Progress callback that ignores everything
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {}

/// Batch settings
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub mode: BatchMode,
    /// Worker threads, `None` for one per CPU
    pub threads: Option<usize>,
    pub format: OutputFormat,
    /// Shrink outputs to fit this box, never upscaling
    pub max_size: Option<u32>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            mode: BatchMode::SplitBoth,
            threads: None,
            format: OutputFormat::Png,
            max_size: None,
        }
    }
}

impl BatchOptions {
    pub fn builder() -> BatchOptionsBuilder {
        BatchOptionsBuilder::default()
    }

    /// Thread count actually used
    pub fn thread_count(&self) -> usize {
        self.threads.filter(|&n| n > 0).unwrap_or_else(num_cpus::get)
    }
}

/// Builder for [`BatchOptions`]
#[derive(Debug, Default)]
pub struct BatchOptionsBuilder {
    options: BatchOptions,
}

impl BatchOptionsBuilder {
    #[must_use]
    pub fn mode(mut self, mode: BatchMode) -> Self {
        self.options.mode = mode;
        self
    }

    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.options.threads = Some(threads.max(1));
        self
    }

    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.options.format = format;
        self
    }

    #[must_use]
    pub fn max_size(mut self, size: u32) -> Self {
        self.options.max_size = Some(size.max(1));
        self
    }

    pub fn build(self) -> BatchOptions {
        self.options
    }
}

/// Runs one [`BatchMode`] over many files
pub struct BatchProcessor {
    analyzer: SpreadAnalyzer,
    options: BatchOptions,
}

impl BatchProcessor {
    pub fn new(analyzer: SpreadAnalyzer, options: BatchOptions) -> Self {
        Self { analyzer, options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Image files directly inside `dir`, sorted by name
    pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Err(SpreadError::ImageNotFound(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Process `inputs` into `output_dir`
    pub fn run(
        &self,
        inputs: &[PathBuf],
        output_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<BatchSummary> {
        std::fs::create_dir_all(output_dir)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.thread_count())
            .build()
            .map_err(|e| SpreadError::InvalidOptions(e.to_string()))?;

        debug!(
            "Batch {} over {} files with {} threads",
            self.options.mode,
            inputs.len(),
            pool.current_num_threads()
        );

        let stems = self.plan_stems(inputs);

        let items: Vec<BatchItem> = pool.install(|| {
            inputs
                .par_iter()
                .zip(stems.par_iter())
                .map(|(input, stem)| {
                    let item = self.process_item(input, stem, output_dir);
                    progress.on_item_complete(&item);
                    item
                })
                .collect()
        });

        Ok(BatchSummary { items })
    }

    /// Output stem for every input, in input order.
    ///
    /// Stems never share an output name, counting the `_left` / `_right`
    /// halves of split-both. A clashing input keeps its source extension in the
    /// stem (`p01_jpg`), then gets a counter.
    pub fn plan_stems(&self, inputs: &[PathBuf]) -> Vec<String> {
        let mut taken: HashSet<String> = HashSet::new();
        inputs
            .iter()
            .map(|input| {
                let stem = file_stem(input);
                let extension = input
                    .extension()
                    .map(|e| e.to_string_lossy().to_ascii_lowercase());
                let chosen = std::iter::once(stem.clone())
                    .chain(extension.map(|e| format!("{}_{}", stem, e)))
                    .chain((2..).map(|n| format!("{}_{}", stem, n)))
                    .find(|candidate| {
                        self.output_names(candidate)
                            .iter()
                            .all(|name| !taken.contains(name))
                    })
                    .unwrap_or_else(|| stem.clone());

                if chosen != stem {
                    warn!(
                        "Output name {} already used in this batch, writing {} as {}",
                        stem,
                        input.display(),
                        chosen
                    );
                }
                taken.extend(self.output_names(&chosen));
                chosen
            })
            .collect()
    }

    /// Every output stem an input with `stem` may write
    fn output_names(&self, stem: &str) -> Vec<String> {
        match self.options.mode {
            BatchMode::SplitBoth => vec![
                stem.to_string(),
                format!("{}_{}", stem, Side::Left),
                format!("{}_{}", stem, Side::Right),
            ],
            _ => vec![stem.to_string()],
        }
    }

    /// Process a single file named after its own stem; errors are captured in the item
    pub fn process_one(&self, input: &Path, output_dir: &Path) -> BatchItem {
        self.process_item(input, &file_stem(input), output_dir)
    }

    fn process_item(&self, input: &Path, stem: &str, output_dir: &Path) -> BatchItem {
        match self.try_process(input, stem, output_dir) {
            Ok((action, outputs)) => BatchItem {
                input: input.to_path_buf(),
                outputs,
                action,
                error: None,
            },
            Err(e) => {
                warn!("Failed to process {}: {}", input.display(), e);
                BatchItem::failed(input, &e)
            }
        }
    }

    fn try_process(
        &self,
        input: &Path,
        stem: &str,
        output_dir: &Path,
    ) -> Result<(BatchAction, Vec<PathBuf>)> {
        if !input.exists() {
            return Err(SpreadError::ImageNotFound(input.to_path_buf()));
        }
        let bytes = std::fs::read(input)?;
        let image = codec::decode(&bytes)?;

        if !self.analyzer.is_double_page(&image) {
            let out = self.pass_through(&bytes, output_dir, stem)?;
            return Ok((BatchAction::PassThrough, vec![out]));
        }

        match self.options.mode {
            BatchMode::SplitSpread { keep } => {
                let page = self.analyzer.split_spread(&image, keep)?;
                let out = self.write(&page, output_dir, stem)?;
                Ok((BatchAction::Split { kept: keep }, vec![out]))
            }
            BatchMode::SplitBoth => {
                let mut outputs = Vec::with_capacity(2);
                for side in [Side::Left, Side::Right] {
                    let page = self.analyzer.split_spread(&image, side)?;
                    outputs.push(self.write(&page, output_dir, &format!("{}_{}", stem, side))?);
                }
                Ok((BatchAction::SplitBoth, outputs))
            }
            BatchMode::CoverSide => {
                let side = self.analyzer.classify_cover_side(&image)?;
                let page = self.analyzer.split_spread(&image, side)?;
                let out = self.write(&page, output_dir, stem)?;
                Ok((BatchAction::Split { kept: side }, vec![out]))
            }
            BatchMode::CoverRegion => match self.analyzer.detect_cover_region(&image)? {
                Some(cover) => {
                    let out = self.write(&cover, output_dir, stem)?;
                    Ok((BatchAction::CoverCropped, vec![out]))
                }
                None => {
                    let out = self.pass_through(&bytes, output_dir, stem)?;
                    Ok((BatchAction::PassThrough, vec![out]))
                }
            },
        }
    }

    fn output_path(&self, output_dir: &Path, stem: &str) -> PathBuf {
        output_dir.join(format!("{}.{}", stem, self.options.format.extension()))
    }

    fn finish(&self, encoded: Vec<u8>) -> Result<Vec<u8>> {
        match self.options.max_size {
            Some(size) => codec::resize_to_fit(&encoded, self.options.format, size),
            None => Ok(encoded),
        }
    }

    fn write(&self, image: &DynamicImage, output_dir: &Path, stem: &str) -> Result<PathBuf> {
        let encoded = self.finish(codec::encode(image, self.options.format)?)?;
        let path = self.output_path(output_dir, stem);
        std::fs::write(&path, encoded)?;
        Ok(path)
    }

    /// Write the original bytes, converting only when the format differs
    fn pass_through(&self, bytes: &[u8], output_dir: &Path, stem: &str) -> Result<PathBuf> {
        let same_format = image::guess_format(bytes).ok() == Some(self.options.format.image_format());
        let encoded = if same_format {
            bytes.to_vec()
        } else {
            codec::convert(bytes, self.options.format)?
        };
        let encoded = self.finish(encoded)?;
        let path = self.output_path(output_dir, stem);
        std::fs::write(&path, encoded)?;
        Ok(path)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
