//! Writing result bundles and run summaries to disk as JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ideaspread_analysis::BundleSummary;
use ideaspread_core::config::OutputConfig;
use ideaspread_types::ResultBundle;
use serde::Serialize;

use crate::error::EngineError;

/// Base file name (without extension) for a run's output files.
pub fn run_file_stem(prefix: &str, bundle: &ResultBundle) -> String {
    format!(
        "{prefix}-n{}-alpha{}-seed{}",
        bundle.config.grid_size, bundle.config.alpha, bundle.seed
    )
}

/// Serialize `value` as JSON into `dir/file_name`, creating `dir` if
/// needed. Returns the written path.
pub fn write_json<T: Serialize>(
    dir: &Path,
    file_name: &str,
    value: &T,
) -> Result<PathBuf, EngineError> {
    std::fs::create_dir_all(dir).map_err(|source| EngineError::Output {
        path: dir.display().to_string(),
        source,
    })?;

    let path = dir.join(file_name);
    let output_error = |source| EngineError::Output {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(&path).map_err(output_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|source| EngineError::Encode {
        what: file_name.to_owned(),
        source,
    })?;
    writer.flush().map_err(output_error)?;
    Ok(path)
}

/// Write a run's bundle (if enabled) and its summary (if computed).
pub fn write_run(
    output: &OutputConfig,
    bundle: &ResultBundle,
    summary: Option<&BundleSummary>,
) -> Result<Vec<PathBuf>, EngineError> {
    let dir = Path::new(&output.directory);
    let stem = run_file_stem(&output.file_prefix, bundle);
    let mut written = Vec::new();

    if output.write_bundles {
        written.push(write_json(dir, &format!("{stem}.json"), bundle)?);
    }
    if let Some(summary) = summary {
        written.push(write_json(dir, &format!("{stem}.summary.json"), summary)?);
    }
    Ok(written)
}
