//! Batch runner binary for the idea-spreading simulation.
//!
//! Loads the configuration, runs every configured simulation concurrently,
//! and writes each result bundle (plus an analysis summary) as JSON.
//!
//! # Startup Sequence
//!
//! 1. Read configuration from `ideaspread-config.yaml` (or the file named by
//!    `IDEASPREAD_CONFIG`)
//! 2. Initialize structured logging (tracing) at the configured level, then
//!    apply environment overrides so rejected ones are logged
//! 3. Expand the config into run plans (alphas x seeds)
//! 4. Run the batch on the blocking thread pool
//! 5. Summarize, log, and write every run

mod error;
mod output;

use std::path::{Path, PathBuf};

use ideaspread_core::config::SimulationConfig;
use ideaspread_core::runner::{self, ProgressLog};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Environment variable naming the configuration file.
const CONFIG_PATH_ENV: &str = "IDEASPREAD_CONFIG";

/// Configuration file used when `IDEASPREAD_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "ideaspread-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration loading, any simulation run, or
/// writing the output fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Read configuration.
    let (mut config, config_path) = load_config(|key| std::env::var(key).ok())?;

    // 2. Initialize structured logging, then apply overrides.
    let fallback_level = config.logging.level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level)),
        )
        .with_target(true)
        .init();
    config.apply_env_overrides();

    info!("ideaspread-engine starting");
    info!(
        config_path = ?config_path,
        grid_size = config.simulation.grid_size,
        resolution = config.simulation.resolution,
        tmax = config.simulation.tmax(),
        alpha = config.simulation.alpha,
        seed = config.simulation.seed,
        "Configuration loaded"
    );

    // 3. Expand into run plans.
    let plans = config.run_plans();
    info!(
        runs = plans.len(),
        seeds = config.experiment.seeds.len(),
        alphas = config.experiment.alphas.len(),
        "Run plans prepared"
    );

    // 4. Run the batch.
    let progress_every = config.logging.progress_every;
    let bundles = runner::run_batch(plans, move |plan| {
        ProgressLog::for_plan(progress_every, plan)
    })
    .await
    .map_err(EngineError::from)?;

    // 5. Summarize and write.
    for bundle in &bundles {
        runner::log_simulation_end(bundle);

        let summary = config
            .analysis
            .enabled
            .then(|| ideaspread_analysis::summarize(bundle, config.analysis.spread_count));
        if let Some(summary) = &summary {
            info!(
                run_id = %summary.run_id,
                final_distinct = summary.final_distinct,
                peak_distinct = summary.peak_distinct,
                strategies_seen = summary.strategies_seen,
                dominant_changes = summary.dominant_changes,
                mean_waiting_time = summary.mean_waiting_time,
                largest_final_cluster = summary.largest_final_cluster,
                "Run summary"
            );
        }

        for path in output::write_run(&config.output, bundle, summary.as_ref())? {
            info!(path = %path.display(), "Output written");
        }
    }

    info!(runs = bundles.len(), "ideaspread-engine shutdown complete");
    Ok(())
}

/// Read the simulation configuration.
///
/// Reads the file named by `IDEASPREAD_CONFIG` (resolved through `lookup`),
/// or `ideaspread-config.yaml` in the working directory. A missing file
/// yields the defaults. Environment overrides are not applied here. Returns
/// the path that was read, if any.
fn load_config(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let config_path = lookup(CONFIG_PATH_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if Path::new(&config_path).exists() {
        let config = SimulationConfig::read_file(&config_path)?;
        Ok((config, Some(config_path)))
    } else {
        Ok((SimulationConfig::default(), None))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ideaspread_core::config::SEED_ENV;

    use super::*;

    #[test]
    fn config_is_read_without_overrides() {
        let path = std::env::temp_dir().join(format!(
            "ideaspread-engine-config-{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "simulation:\n  seed: 3\nlogging:\n  level: \"warn\"\n").unwrap();
        let lookup = |key: &str| match key {
            CONFIG_PATH_ENV => Some(path.display().to_string()),
            SEED_ENV => Some("not-a-seed".to_owned()),
            _ => None,
        };

        let (config, read_from) = load_config(lookup).unwrap();
        assert_eq!(read_from.as_deref(), Some(path.as_path()));
        assert_eq!(config.simulation.seed, 3);
        assert_eq!(config.logging.level, "warn");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let lookup = |key: &str| {
            (key == CONFIG_PATH_ENV).then(|| "/nonexistent/ideaspread.yaml".to_owned())
        };
        let (config, read_from) = load_config(lookup).unwrap();
        assert_eq!(read_from, None);
        assert_eq!(config, SimulationConfig::default());
    }
}
