//! Error types for the display host binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the display loop.

/// Top-level error for the display host.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: hivemap_core::config::ConfigError,
    },

    /// The display loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: hivemap_core::runner::RunnerError,
    },

    /// Reading operator input failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
