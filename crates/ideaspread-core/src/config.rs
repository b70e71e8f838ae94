//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `ideaspread-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads the file and expands it
//! into one [`RunPlan`] per simulation to execute.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the reference setup: a 128 x 128 grid, 40 000 snapshots over 80 000
//! sweeps, and a mutation rate of `2.5e-5`.

use std::path::Path;

use ideaspread_types::RunConfig;
use serde::Deserialize;

use crate::engine::RunPlan;

/// Environment variable overriding `simulation.seed`.
pub const SEED_ENV: &str = "IDEASPREAD_SEED";

/// Environment variable overriding `output.directory`.
pub const OUTPUT_DIR_ENV: &str = "IDEASPREAD_OUTPUT_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `ideaspread-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Model parameters for the base run.
    #[serde(default)]
    pub simulation: ModelConfig,

    /// Sweep over seeds and mutation rates.
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// Where result bundles are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Post-run analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `IDEASPREAD_SEED` overrides `simulation.seed`
    /// - `IDEASPREAD_OUTPUT_DIR` overrides `output.directory`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a YAML file without environment overrides.
    ///
    /// Lets a caller install logging from the file's settings before
    /// applying overrides, whose rejections are logged.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string. No environment overrides are
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml reads an empty document as null rather than an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Override values from the process environment when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Override values using an arbitrary variable lookup.
    ///
    /// Unparseable seeds are ignored with a warning.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(SEED_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => self.simulation.seed = seed,
                Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring invalid seed override"),
            }
        }
        if let Some(dir) = lookup(OUTPUT_DIR_ENV) {
            self.output.directory = dir;
        }
    }

    /// The base run described by the `simulation` section.
    pub fn base_plan(&self) -> RunPlan {
        RunPlan {
            config: self.simulation.run_config(self.simulation.alpha),
            resolution: self.simulation.resolution,
            seed: self.simulation.seed,
        }
    }

    /// Every run to execute: the cartesian product of the experiment's
    /// mutation rates and seeds, falling back to the base values when a list
    /// is empty. Plans are ordered by alpha, then seed.
    pub fn run_plans(&self) -> Vec<RunPlan> {
        let alphas = if self.experiment.alphas.is_empty() {
            vec![self.simulation.alpha]
        } else {
            self.experiment.alphas.clone()
        };
        let seeds = if self.experiment.seeds.is_empty() {
            vec![self.simulation.seed]
        } else {
            self.experiment.seeds.clone()
        };

        alphas
            .iter()
            .flat_map(|&alpha| {
                seeds.iter().map(move |&seed| RunPlan {
                    config: self.simulation.run_config(alpha),
                    resolution: self.simulation.resolution,
                    seed,
                })
            })
            .collect()
    }
}

/// Model parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    /// Grid side length `N`.
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,

    /// Target number of snapshots.
    #[serde(default = "default_resolution")]
    pub resolution: u64,

    /// Run length in sweeps. Defaults to twice the resolution.
    #[serde(default)]
    pub tmax: Option<u64>,

    /// Mutation probability per micro-step.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl ModelConfig {
    /// Effective run length in sweeps.
    pub fn tmax(&self) -> u64 {
        self.tmax
            .unwrap_or_else(|| self.resolution.saturating_mul(2))
    }

    /// The run configuration for a given mutation rate.
    pub fn run_config(&self, alpha: f64) -> RunConfig {
        RunConfig {
            grid_size: self.grid_size,
            tmax: self.tmax(),
            alpha,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            resolution: default_resolution(),
            tmax: None,
            alpha: default_alpha(),
            seed: default_seed(),
        }
    }
}

/// Parameter sweep. Empty lists fall back to the `simulation` values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExperimentConfig {
    /// Seeds to run.
    #[serde(default)]
    pub seeds: Vec<u64>,

    /// Mutation rates to run.
    #[serde(default)]
    pub alphas: Vec<f64>,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// Directory result bundles are written to.
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// File name prefix for result bundles.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Whether bundles are written at all.
    #[serde(default = "default_true")]
    pub write_bundles: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            file_prefix: default_file_prefix(),
            write_bundles: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log run progress at info level every this many snapshots
    /// (0 = only at debug level).
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            progress_every: default_progress_every(),
        }
    }
}

/// Post-run analysis settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalysisConfig {
    /// Whether a summary is computed and logged for each run.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Number of evenly spread snapshots included in the overview.
    #[serde(default = "default_spread_count")]
    pub spread_count: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spread_count: default_spread_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_grid_size() -> u32 {
    128
}

const fn default_resolution() -> u64 {
    40_000
}

const fn default_alpha() -> f64 {
    25e-6
}

const fn default_seed() -> u64 {
    42
}

fn default_output_directory() -> String {
    "data".to_owned()
}

fn default_file_prefix() -> String {
    "data".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_progress_every() -> u64 {
    1_000
}

const fn default_spread_count() -> usize {
    5
}

const fn default_true() -> bool {
    true
}
