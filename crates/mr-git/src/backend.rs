//! Backend capability traits and the closed set of supported backends

use std::fmt;

use mr_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::{GitBackend, Result};

/// A local working copy opened by a [`RepoBackend`].
pub trait WorkingCopy {
    /// Root directory of the working copy.
    fn path(&self) -> &NormalizedPath;

    /// URL of the configured remote, `None` when there is none.
    fn remote_url(&self) -> Result<Option<String>>;

    /// Whether tracked files have uncommitted changes.
    fn is_dirty(&self) -> Result<bool>;
}

/// Capability interface over a single version-control system.
///
/// Deleting a working copy is deliberately absent: it is a plain
/// recursive filesystem removal and does not depend on the backend.
pub trait RepoBackend {
    /// Tag recorded for working copies handled by this backend.
    fn backend_type(&self) -> BackendType;

    /// Open the working copy rooted at `path`.
    ///
    /// Fails unless `path` itself is the root of a working copy; parent
    /// directories are not searched.
    fn open(&self, path: &NormalizedPath) -> Result<Box<dyn WorkingCopy>>;

    /// Clone `remote` into `destination`, which must be absent or empty.
    fn clone_remote(&self, remote: &str, destination: &NormalizedPath)
    -> Result<Box<dyn WorkingCopy>>;
}

/// Backend tag as persisted in the declarations document.
///
/// Unknown tags are preserved so documents written by other tools still
/// load; they are rejected only when a backend is actually needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackendType {
    Git,
    Unsupported(String),
}

impl BackendType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Git => "Git",
            Self::Unsupported(tag) => tag,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl From<String> for BackendType {
    fn from(tag: String) -> Self {
        if tag == "Git" {
            Self::Git
        } else {
            Self::Unsupported(tag)
        }
    }
}

impl From<&str> for BackendType {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<BackendType> for String {
    fn from(kind: BackendType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Git(GitBackend),
}

impl Backend {
    /// Every supported backend, in detection order.
    pub fn all() -> [Backend; 1] {
        [Backend::Git(GitBackend)]
    }

    /// Backend responsible for `kind`, `None` for unsupported tags.
    pub fn for_type(kind: &BackendType) -> Option<Backend> {
        match kind {
            BackendType::Git => Some(Backend::Git(GitBackend)),
            BackendType::Unsupported(_) => None,
        }
    }

    /// Open `path` with the first backend that recognises it.
    pub fn detect(path: &NormalizedPath) -> Option<(Backend, Box<dyn WorkingCopy>)> {
        Self::all().into_iter().find_map(|backend| match backend.open(path) {
            Ok(copy) => Some((backend, copy)),
            Err(e) => {
                tracing::trace!(path = %path, backend = %backend.backend_type(), error = %e, "Not recognised");
                None
            }
        })
    }

    /// Whether any backend recognises `path` as a working copy.
    pub fn is_working_copy(path: &NormalizedPath) -> bool {
        Self::detect(path).is_some()
    }
}

impl RepoBackend for Backend {
    fn backend_type(&self) -> BackendType {
        match self {
            Backend::Git(git) => git.backend_type(),
        }
    }

    fn open(&self, path: &NormalizedPath) -> Result<Box<dyn WorkingCopy>> {
        match self {
            Backend::Git(git) => git.open(path),
        }
    }

    fn clone_remote(
        &self,
        remote: &str,
        destination: &NormalizedPath,
    ) -> Result<Box<dyn WorkingCopy>> {
        match self {
            Backend::Git(git) => git.clone_remote(remote, destination),
        }
    }
}
