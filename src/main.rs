//! spreadcut - spread splitting and cover cropping for page scans
//!
//! CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use image::DynamicImage;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use spreadcut::{
    codec, draw_analysis, exit_codes, AnalyzeArgs, BatchArgs, BatchOptions, BatchProcessor,
    BatchProgress, Cli, CliOverrides, Commands, Config, CoverRegionArgs, CoverSideArgs, InfoArgs,
    OutputFormat, OutputMode, SplitArgs, SpreadAnalyzer, SpreadError,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let overrides = cli.tuning.to_overrides();
    let config = load_config(cli.config.as_deref());

    let result = match &cli.command {
        Commands::Info(args) => run_info(args),
        Commands::Split(args) => run_split(args, &config, &overrides),
        Commands::CoverSide(args) => run_cover_side(args, &config, &overrides),
        Commands::CoverRegion(args) => run_cover_region(args, &config, &overrides),
        Commands::Analyze(args) => run_analyze(args, &config, &overrides),
        Commands::Batch(args) => run_batch(args, &config, &overrides, cli.verbose),
        Commands::Config => run_config(&config, &overrides),
    };

    std::process::exit(match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    });
}

/// 0 = warn, 1 = info, 2 = debug, 3+ = trace; `RUST_LOG` wins when set
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => match Config::load_from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_default(),
    }
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<SpreadError>() {
        Some(SpreadError::ImageNotFound(_)) => exit_codes::INPUT_NOT_FOUND,
        Some(SpreadError::InvalidOptions(_)) => exit_codes::INVALID_ARGS,
        _ => exit_codes::GENERAL_ERROR,
    }
}

fn analyzer(config: &Config, overrides: &CliOverrides) -> Result<SpreadAnalyzer> {
    let options = config.merge_with_cli(overrides)?;
    Ok(SpreadAnalyzer::new(options))
}

/// Output format from the file extension, then config/CLI
fn output_format_for(path: &Path, config: &Config, overrides: &CliOverrides) -> OutputFormat {
    overrides.format.unwrap_or_else(|| {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(OutputFormat::from_extension)
            .unwrap_or_else(|| config.output_format(overrides))
    })
}

fn write_image(image: &DynamicImage, path: &Path, format: OutputFormat) -> Result<()> {
    let bytes = codec::encode(image, format)?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

// ============ Commands ============

fn run_info(args: &InfoArgs) -> Result<i32> {
    let image = codec::open(&args.input)?;
    let analyzer = SpreadAnalyzer::default();

    println!("File:        {}", args.input.display());
    println!("Dimensions:  {}x{}", image.width(), image.height());
    println!("Color:       {:?}", image.color());
    println!(
        "Double page: {}",
        if analyzer.is_double_page(&image) { "yes" } else { "no" }
    );
    Ok(exit_codes::SUCCESS)
}

fn run_split(args: &SplitArgs, config: &Config, overrides: &CliOverrides) -> Result<i32> {
    let analyzer = analyzer(config, overrides)?;
    let image = codec::open(&args.input)?;
    let page = analyzer.split_spread(&image, args.side.into())?;
    write_image(&page, &args.output, output_format_for(&args.output, config, overrides))?;
    println!(
        "{} -> {} ({}x{})",
        args.input.display(),
        args.output.display(),
        page.width(),
        page.height()
    );
    Ok(exit_codes::SUCCESS)
}

fn run_cover_side(args: &CoverSideArgs, config: &Config, overrides: &CliOverrides) -> Result<i32> {
    let analyzer = analyzer(config, overrides)?;
    let image = codec::open(&args.input)?;
    println!("{}", analyzer.classify_cover_side(&image)?);
    Ok(exit_codes::SUCCESS)
}

fn run_cover_region(
    args: &CoverRegionArgs,
    config: &Config,
    overrides: &CliOverrides,
) -> Result<i32> {
    let analyzer = analyzer(config, overrides)?;
    let image = codec::open(&args.input)?;
    let format = output_format_for(&args.output, config, overrides);

    match analyzer.detect_cover_region(&image)? {
        Some(cover) => {
            write_image(&cover, &args.output, format)?;
            println!(
                "Cover region: {}x{} of {}x{} -> {}",
                cover.width(),
                cover.height(),
                image.width(),
                image.height(),
                args.output.display()
            );
            Ok(exit_codes::SUCCESS)
        }
        None if args.strict => {
            eprintln!("No cover region detected in {}", args.input.display());
            Ok(exit_codes::NO_REGION)
        }
        None => {
            write_image(&image, &args.output, format)?;
            println!("No cover region detected, copied input to {}", args.output.display());
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn run_analyze(args: &AnalyzeArgs, config: &Config, overrides: &CliOverrides) -> Result<i32> {
    let analyzer = analyzer(config, overrides)?;
    let image = codec::open(&args.input)?;
    let report = analyzer.analyze(&image)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("File:         {}", args.input.display());
        println!("Dimensions:   {}x{}", report.width, report.height);
        println!("Double page:  {}", report.is_double_page);
        println!(
            "Seam:         x={} (analysis column {}/{}, score {:.3})",
            report.seam.x, report.seam.column, report.seam.analysis_width, report.seam.score
        );
        println!(
            "Cover side:   {} (left {:.3}, right {:.3})",
            report.cover_side.cover, report.cover_side.left.score, report.cover_side.right.score
        );
        match report.cover_region.crop() {
            Some(rect) => println!(
                "Cover region: x={}..{} ({:.1}% of width)",
                rect.x,
                rect.right(),
                rect.width_ratio(report.width) * 100.0
            ),
            None => println!("Cover region: none ({:?})", report.cover_region.outcome),
        }
    }

    if let Some(path) = &args.annotate {
        let overlay = DynamicImage::ImageRgb8(draw_analysis(&image, &report));
        write_image(&overlay, path, output_format_for(path, config, overrides))?;
    }

    Ok(exit_codes::SUCCESS)
}

fn run_batch(
    args: &BatchArgs,
    config: &Config,
    overrides: &CliOverrides,
    verbose: u8,
) -> Result<i32> {
    let analyzer = analyzer(config, overrides)?;
    let inputs = BatchProcessor::collect_images(&args.input)?;
    if inputs.is_empty() {
        eprintln!("Error: No images found in {}", args.input.display());
        return Ok(exit_codes::INPUT_NOT_FOUND);
    }

    let mut builder = BatchOptions::builder()
        .mode(args.mode.into())
        .format(config.output_format(overrides));
    if let Some(jobs) = args.jobs {
        builder = builder.threads(jobs);
    }
    if let Some(size) = args.max_size {
        builder = builder.max_size(size);
    }

    let processor = BatchProcessor::new(analyzer, builder.build());
    let progress = BatchProgress::new(inputs.len(), OutputMode::from_verbosity(verbose));
    let summary = processor.run(&inputs, &args.output, &progress)?;
    progress.finish();

    spreadcut::print_summary(&summary);

    Ok(if summary.failed() > 0 {
        exit_codes::GENERAL_ERROR
    } else {
        exit_codes::SUCCESS
    })
}

fn run_config(config: &Config, overrides: &CliOverrides) -> Result<i32> {
    let options = config.merge_with_cli(overrides)?;
    let effective = Config {
        seam: options.seam,
        cover_side: options.cover_side,
        cover_region: options.cover_region,
        output: spreadcut::OutputConfig {
            format: config.output_format(overrides),
            resample: options.resample,
        },
    };
    print!("{}", effective.to_toml()?);
    Ok(exit_codes::SUCCESS)
}
