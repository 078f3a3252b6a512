//! Error kinds surfaced by the transcode pipeline.

use crate::domain::asset::AssetId;
use crate::domain::jobs::JobId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The encoder exited with a non-zero status. `stderr` is the captured
    /// diagnostic stream, uninterpreted.
    #[error("{program} failed (code {code:?}): {stderr}")]
    ExternalProcess {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("source media not found: {0:?}")]
    MissingInput(PathBuf),

    #[error("queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset {0} was cancelled")]
    Cancelled(AssetId),

    #[error("no variant was produced for asset {0}")]
    NoVariantsProduced(AssetId),

    #[error("asset {0} already has a pipeline in flight")]
    AlreadyProcessing(AssetId),

    #[error("unknown job {0}")]
    UnknownJob(JobId),

    #[error("unknown dependency {0}")]
    UnknownDependency(JobId),

    #[error("repository error: {0}")]
    Repository(String),
}

impl PipelineError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Only encoder failures are worth another attempt; everything else is
    /// deterministic for a given input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::ExternalProcess { .. })
    }
}
