//! Error types for mr-git

use std::path::PathBuf;

/// Result type for mr-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mr-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] mr_fs::Error),

    #[error("{path} is not a working copy: {message}")]
    NotAWorkingCopy { path: PathBuf, message: String },

    #[error("Cloning {remote} into {path} failed: {message}")]
    CloneFailed {
        remote: String,
        path: PathBuf,
        message: String,
    },
}
