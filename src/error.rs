//! Error taxonomy for the grading orchestrator.
//!
//! Two scopes: [`BatchError`] kinds abort the whole run and are only raised
//! before any container is touched; [`SubmissionError`] kinds are caught at
//! the submission boundary and converted into a reported outcome, so one bad
//! submission never takes down the rest of the batch.

use std::path::PathBuf;
use std::time::Duration;

/// Whole-run failures. Raised during input validation or while preparing the
/// shared extra payload, before any container mutation occurs.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("invalid batch folder: {0} is not a directory")]
    InvalidBatchFolder(PathBuf),

    #[error("invalid extra file: {0} does not exist")]
    InvalidExtraFile(PathBuf),

    /// Packaging the shared extra payload failed. Per-submission packaging
    /// failures are reported per submission instead.
    #[error(transparent)]
    Packaging(#[from] PackagingError),
}

/// Archive creation or source inspection failed.
#[derive(Debug, thiserror::Error)]
#[error("failed to package {path}: {source}")]
pub struct PackagingError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A call to the container runtime failed (daemon unreachable, API error).
/// The reason string carries whatever the daemon reported.
#[derive(Debug, thiserror::Error)]
#[error("container runtime error: {0}")]
pub struct RuntimeError(pub String);

/// Per-submission failures. Each one abandons the current submission only.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Packaging(#[from] PackagingError),

    #[error("failed to remove existing container {name}: {reason}")]
    Removal { name: String, reason: String },

    #[error("failed to create container {name}: {reason}")]
    Creation { name: String, reason: String },

    #[error("failed to extract archive into container {name}: {reason}")]
    Extraction { name: String, reason: String },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("submission timed out after {0:?}")]
    Timeout(Duration),
}

/// Invalid environment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}
