//! `.alertbench.toml`: file locations, report expectations and chart sizes.
//!
//! Every key is optional; command-line flags are applied on top afterwards.

use std::path::{Path, PathBuf};

use alertbench_core::{ChartOptions, Implementation};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration for alertbench.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for the collect step.
    pub collect: CollectConfig,
    /// Settings for the report step.
    pub report: ReportConfig,
    /// Image dimensions for rendered charts.
    pub charts: ChartOptions,
}

/// Configuration for the collect step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Where the results table is written.
    pub output: PathBuf,
}

/// Configuration for the report step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Results table to read.
    pub input: PathBuf,
    /// Directory that receives the chart images.
    pub output_dir: PathBuf,
    /// Implementations that must be present in the table.
    pub expected_implementations: Vec<Implementation>,
    /// Allowed relative deviation of request count and bytes transferred
    /// within one implementation, relative to its first sample (0.0 requires
    /// exact equality; a first value of 0 never tolerates a deviation).
    pub consistency_tolerance: f64,
    /// Whether to color the terminal summary.
    pub color: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_RESULTS_FILE),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_RESULTS_FILE),
            output_dir: PathBuf::from("plots"),
            expected_implementations: Implementation::ALL.to_vec(),
            consistency_tolerance: 0.0,
            color: true,
        }
    }
}

/// Default results table shared by both steps.
const DEFAULT_RESULTS_FILE: &str = "performance_results.csv";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".alertbench.toml";

impl Config {
    /// Parse the TOML file at `path`. Missing sections and keys take their defaults.
    pub fn load(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// [`Config::load`] on `.alertbench.toml` in the working directory, if there is one.
    pub fn load_or_default() -> Result<Config> {
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if !fallback.is_file() {
            return Ok(Config::default());
        }
        Self::load(fallback)
    }

    /// Use `path` when given (it must exist), otherwise [`Config::load_or_default`].
    pub fn load_from(path: Option<&Path>) -> Result<Config> {
        path.map_or_else(Self::load_or_default, Self::load)
    }
}
