//! Configuration file support
//!
//! Settings are read from TOML. Every section and field is optional; missing
//! values keep their built-in defaults, and command-line overrides win over
//! both.
//!
//! ```toml
//! [seam]
//! analysis_height = 300
//!
//! [cover_region]
//! edge_threshold = 30.0
//! min_continuity = 0.15
//!
//! [output]
//! format = "png"
//! resample = "triangle"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codec::OutputFormat;
use crate::cover_region::CoverRegionOptions;
use crate::cover_side::CoverSideOptions;
use crate::sampler::ResampleFilter;
use crate::seam::SeamOptions;
use crate::types::{Result, SpreadError};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "spreadcut";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Everything the analysis stages need
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub seam: SeamOptions,
    pub cover_side: CoverSideOptions,
    pub cover_region: CoverRegionOptions,
    pub resample: ResampleFilter,
}

impl AnalysisOptions {
    /// Validate every stage's options
    pub fn validate(&self) -> Result<()> {
        self.seam.validate()?;
        self.cover_region.validate()?;
        Ok(())
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Container for written images
    pub format: OutputFormat,
    /// Resample filter for analysis buffers
    pub resample: ResampleFilter,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            resample: ResampleFilter::default(),
        }
    }
}

/// On-disk configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub seam: SeamOptions,
    pub cover_side: CoverSideOptions,
    pub cover_region: CoverRegionOptions,
    pub output: OutputConfig,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub analysis_height: Option<u32>,
    pub edge_threshold: Option<f64>,
    pub min_continuity: Option<f64>,
    pub max_width_ratio: Option<f64>,
    pub resample: Option<ResampleFilter>,
    pub format: Option<OutputFormat>,
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SpreadError::InvalidOptions(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SpreadError::InvalidOptions(e.to_string()))
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SpreadError::InvalidOptions(e.to_string()))
    }

    /// Output format after applying overrides
    pub fn output_format(&self, overrides: &CliOverrides) -> OutputFormat {
        overrides.format.unwrap_or(self.output.format)
    }

    /// Apply CLI overrides and produce validated analysis options
    pub fn merge_with_cli(&self, overrides: &CliOverrides) -> Result<AnalysisOptions> {
        let mut options = AnalysisOptions {
            seam: self.seam.clone(),
            cover_side: self.cover_side.clone(),
            cover_region: self.cover_region.clone(),
            resample: self.output.resample,
        };

        if let Some(height) = overrides.analysis_height {
            options.seam.analysis_height = height;
            options.cover_region.analysis_height = height;
        }
        if let Some(threshold) = overrides.edge_threshold {
            options.cover_region.edge_threshold = threshold;
        }
        if let Some(continuity) = overrides.min_continuity {
            options.cover_region.min_continuity = continuity.clamp(0.0, 1.0);
        }
        if let Some(ratio) = overrides.max_width_ratio {
            options.cover_region.max_width_ratio = ratio.clamp(0.0, 1.0);
        }
        if let Some(resample) = overrides.resample {
            options.resample = resample;
        }

        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
            [seam]
            analysis_height = 200

            [cover_region]
            min_continuity = 0.25
            left_search = [0.1, 0.4]

            [output]
            format = "jpeg"
            resample = "lanczos3"
            "#,
        )
        .unwrap();

        assert_eq!(config.seam.analysis_height, 200);
        assert_eq!(config.seam.search_start, 0.35);
        assert_eq!(config.cover_region.min_continuity, 0.25);
        assert_eq!(config.cover_region.left_search, (0.1, 0.4));
        assert_eq!(config.cover_region.edge_threshold, 30.0);
        assert_eq!(config.output.format, OutputFormat::Jpeg);
        assert_eq!(config.output.resample, ResampleFilter::Lanczos3);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[seam]\nanalysis_height = \"tall\"").unwrap_err();
        assert!(matches!(err, SpreadError::InvalidOptions(_)));
    }

    #[test]
    fn test_toml_round_trip_defaults() {
        let text = Config::default().to_toml().unwrap();
        assert!(text.contains("[seam]"));
        assert!(text.contains("[cover_region]"));
        assert_eq!(Config::from_toml(&text).unwrap(), Config::default());
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let config = Config::default();
        let overrides = CliOverrides {
            analysis_height: Some(250),
            edge_threshold: Some(20.0),
            min_continuity: Some(1.5),
            max_width_ratio: Some(0.7),
            resample: Some(ResampleFilter::Nearest),
            format: Some(OutputFormat::Jpeg),
        };
        let options = config.merge_with_cli(&overrides).unwrap();

        assert_eq!(options.seam.analysis_height, 250);
        assert_eq!(options.cover_region.analysis_height, 250);
        assert_eq!(options.cover_region.edge_threshold, 20.0);
        assert_eq!(options.cover_region.min_continuity, 1.0);
        assert_eq!(options.cover_region.max_width_ratio, 0.7);
        assert_eq!(options.resample, ResampleFilter::Nearest);
        assert_eq!(config.output_format(&overrides), OutputFormat::Jpeg);
    }

    #[test]
    fn test_merge_rejects_invalid() {
        let overrides = CliOverrides {
            analysis_height: Some(0),
            ..Default::default()
        };
        assert!(Config::default().merge_with_cli(&overrides).is_err());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cover_side]\nedge_weight = 4.0\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.cover_side.edge_weight, 4.0);
        assert_eq!(config.cover_side.color_weight, 0.01);

        assert!(Config::load_from_path(&dir.path().join("missing.toml")).is_err());
    }
}
