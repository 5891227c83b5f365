//! Error types for mr-core

use std::path::PathBuf;

use mr_git::BackendType;

use crate::store::ValidationReport;

/// Result type for mr-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mr-core operations
///
/// Everything except the transparent wrappers is an expected outcome of a
/// command and leaves the registry documents untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Registry root is not a directory
    #[error("{path} is not a directory.")]
    NotADirectory { path: PathBuf },

    /// Registry root has no declarations document
    #[error("{path} is not a Mr. Repo repo.")]
    NotARegistry { path: PathBuf },

    #[error("{name} is already controlled by Mr. Repo (i.e it is in {file}).")]
    AlreadyDeclared { name: String, file: String },

    #[error("'{name}' is not a Mr. Repo controlled repository.")]
    UnknownRepository { name: String },

    #[error("'{name}' is not a currently checked out Mr. Repo controlled repository.")]
    NotCheckedOut { name: String },

    /// No backend recognises the path as a working copy
    #[error("{path} is not a supported repository.")]
    UnsupportedRepository { path: PathBuf },

    /// Declared backend tag has no implementation
    #[error("Repositories of type '{kind}' are not supported.")]
    UnsupportedBackend { kind: BackendType },

    #[error("{name} does not have an associated remote to repossess it from.")]
    NoRemote { name: String },

    #[error("'{name}' is dirty. Fix it or use the `--force` option to force its removal.")]
    DirtyWorkingCopy { name: String },

    #[error("Could not clone '{name}': {source}")]
    CloneFailure {
        name: String,
        #[source]
        source: mr_git::Error,
    },

    /// Explicit validation found malformed documents
    #[error("Registry documents are invalid: {report}")]
    InvalidDocuments { report: ValidationReport },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from mr-fs
    #[error(transparent)]
    Fs(#[from] mr_fs::Error),

    /// Backend error from mr-git
    #[error(transparent)]
    Git(#[from] mr_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is an expected business outcome rather than an
    /// environmental failure.
    pub fn is_business_rule(&self) -> bool {
        !matches!(self, Self::Fs(_) | Self::Git(_) | Self::Io(_))
    }
}
