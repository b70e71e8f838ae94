//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup, the simulation batch, and output.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ideaspread_core::config::ConfigError,
    },

    /// A simulation run failed to start or finish.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: ideaspread_core::runner::RunnerError,
    },

    /// Writing results to disk failed.
    #[error("output error for {path}: {source}")]
    Output {
        /// The file or directory being written.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Encoding results as JSON failed.
    #[error("failed to encode {what}: {source}")]
    Encode {
        /// What was being encoded.
        what: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}
