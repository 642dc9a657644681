use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::config::ConfigError;
use crate::git::GitError;
use crate::process::CommandError;

/// Failure of one pipeline stage for a single unit.
///
/// Remote API errors are carried as strings so this crate stays free of the
/// HTTP client stack; see `qg_integrations::TrackerError`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("remote api: {0}")]
    Remote(String),
    #[error(transparent)]
    Tool(#[from] CommandError),
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("filesystem: {0}")]
    Filesystem(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
