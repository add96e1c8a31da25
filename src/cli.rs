//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::batch::BatchMode;
use crate::codec::OutputFormat;
use crate::config::CliOverrides;
use crate::sampler::ResampleFilter;
use crate::types::Side;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
    /// `cover-region --strict` found no frame
    pub const NO_REGION: i32 = 4;
}

/// Double-page spread splitting and cover cropping for page scans
#[derive(Parser, Debug)]
#[command(name = "spreadcut", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show dimensions and whether the image is a spread
    Info(InfoArgs),
    /// Crop one half of a spread
    Split(SplitArgs),
    /// Print which half of a spread is the front cover
    CoverSide(CoverSideArgs),
    /// Crop a wraparound cover scan to its front cover
    CoverRegion(CoverRegionArgs),
    /// Run every detector and print the results
    Analyze(AnalyzeArgs),
    /// Process every image in a directory
    Batch(BatchArgs),
    /// Print the effective configuration as TOML
    Config,
}

/// Analysis overrides shared by all commands
#[derive(Args, Debug, Default, Clone)]
pub struct TuningArgs {
    /// Height of the downscaled analysis buffers
    #[arg(long, global = true, value_name = "PX")]
    pub analysis_height: Option<u32>,

    /// Gradient threshold for cover frame edges (0-255)
    #[arg(long, global = true)]
    pub edge_threshold: Option<f64>,

    /// Minimum fraction of rows a frame line must span
    #[arg(long, global = true)]
    pub min_continuity: Option<f64>,

    /// Cover crops keeping at least this width fraction are discarded
    #[arg(long, global = true)]
    pub max_width_ratio: Option<f64>,

    /// Downscale filter for analysis buffers
    #[arg(long, global = true, value_enum)]
    pub resample: Option<ResampleArg>,

    /// Output image format
    #[arg(long, global = true, value_enum)]
    pub format: Option<FormatArg>,
}

impl TuningArgs {
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            analysis_height: self.analysis_height,
            edge_threshold: self.edge_threshold,
            min_continuity: self.min_continuity,
            max_width_ratio: self.max_width_ratio,
            resample: self.resample.map(Into::into),
            format: self.format.map(Into::into),
        }
    }
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Input image
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Input spread
    pub input: PathBuf,

    /// Half to keep
    #[arg(short, long, value_enum, default_value_t = SideArg::Left)]
    pub side: SideArg,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct CoverSideArgs {
    /// Input spread
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct CoverRegionArgs {
    /// Input wraparound cover scan
    pub input: PathBuf,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Exit with a distinct code when no frame is found instead of copying the input
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input image
    pub input: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write an overlay of the detections to this file
    #[arg(long, value_name = "OUT")]
    pub annotate: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory of page images
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub output: PathBuf,

    /// What to do with each spread
    #[arg(short, long, value_enum, default_value_t = ModeArg::SplitBoth)]
    pub mode: ModeArg,

    /// Worker threads (default: one per CPU)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Shrink outputs to fit a square of this size
    #[arg(long, value_name = "PX")]
    pub max_size: Option<u32>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideArg {
    Left,
    Right,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::Left => Side::Left,
            SideArg::Right => Side::Right,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    SplitLeft,
    SplitRight,
    SplitBoth,
    CoverSide,
    CoverRegion,
}

impl From<ModeArg> for BatchMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::SplitLeft => BatchMode::SplitSpread { keep: Side::Left },
            ModeArg::SplitRight => BatchMode::SplitSpread { keep: Side::Right },
            ModeArg::SplitBoth => BatchMode::SplitBoth,
            ModeArg::CoverSide => BatchMode::CoverSide,
            ModeArg::CoverRegion => BatchMode::CoverRegion,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleArg {
    Nearest,
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl From<ResampleArg> for ResampleFilter {
    fn from(arg: ResampleArg) -> Self {
        match arg {
            ResampleArg::Nearest => ResampleFilter::Nearest,
            ResampleArg::Triangle => ResampleFilter::Triangle,
            ResampleArg::CatmullRom => ResampleFilter::CatmullRom,
            ResampleArg::Lanczos3 => ResampleFilter::Lanczos3,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Png,
    #[value(alias = "jpg")]
    Jpeg,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Jpeg => OutputFormat::Jpeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_split() {
        let cli = Cli::try_parse_from(["spreadcut", "split", "in.png", "--side", "right", "-o", "out.png"])
            .unwrap();
        match cli.command {
            Commands::Split(args) => {
                assert_eq!(Side::from(args.side), Side::Right);
                assert_eq!(args.output, PathBuf::from("out.png"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_batch_mode_and_jobs() {
        let cli = Cli::try_parse_from([
            "spreadcut", "-vv", "batch", "pages", "-o", "out", "--mode", "cover-region", "-j", "4",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Batch(args) => {
                assert_eq!(BatchMode::from(args.mode), BatchMode::CoverRegion);
                assert_eq!(args.jobs, Some(4));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "spreadcut",
            "cover-region",
            "scan.png",
            "-o",
            "cover.png",
            "--min-continuity",
            "0.3",
            "--resample",
            "catmull-rom",
            "--format",
            "jpg",
        ])
        .unwrap();
        let overrides = cli.tuning.to_overrides();
        assert_eq!(overrides.min_continuity, Some(0.3));
        assert_eq!(overrides.resample, Some(ResampleFilter::CatmullRom));
        assert_eq!(overrides.format, Some(OutputFormat::Jpeg));
    }

    #[test]
    fn test_missing_output_is_error() {
        assert!(Cli::try_parse_from(["spreadcut", "split", "in.png"]).is_err());
    }
}
