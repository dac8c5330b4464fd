//! Error types for gitscribe.
//!
//! Library crates use [`GitScribeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all gitscribe operations.
///
/// Every variant except `Config` and `Io` is fatal to the workflow run that
/// produced it. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum GitScribeError {
    /// The working-tree diff query failed.
    #[error("probe failed: {0}")]
    Probe(String),

    /// The description generator failed, timed out, or returned nothing usable.
    #[error("description failed: {0}")]
    Description(String),

    /// Staging the working tree failed.
    #[error("stage failed: {0}")]
    Stage(String),

    /// Creating the commit failed (hook rejection, nothing staged, ...).
    #[error("commit failed: {0}")]
    Commit(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GitScribeError>;

impl GitScribeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
