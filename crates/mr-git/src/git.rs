//! Git backend built on libgit2

use git2::{Repository, Status, StatusOptions};
use mr_fs::NormalizedPath;

use crate::{
    Error, Result,
    backend::{BackendType, RepoBackend, WorkingCopy},
};

/// Remote consulted first when reading a working copy's origin.
const DEFAULT_REMOTE: &str = "origin";

/// Backend for Git working copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GitBackend;

/// An opened, non-bare Git repository.
pub struct GitWorkingCopy {
    path: NormalizedPath,
    repo: Repository,
}

impl GitWorkingCopy {
    fn new(path: &NormalizedPath, repo: Repository) -> Result<Self> {
        if repo.is_bare() {
            return Err(Error::NotAWorkingCopy {
                path: path.to_native(),
                message: "bare repository has no working tree".into(),
            });
        }
        Ok(Self {
            path: path.clone(),
            repo,
        })
    }
}

impl WorkingCopy for GitWorkingCopy {
    fn path(&self) -> &NormalizedPath {
        &self.path
    }

    fn remote_url(&self) -> Result<Option<String>> {
        if let Ok(remote) = self.repo.find_remote(DEFAULT_REMOTE) {
            return Ok(remote.url().map(str::to_string));
        }

        let names = self.repo.remotes()?;
        for name in names.iter().flatten() {
            let remote = self.repo.find_remote(name)?;
            if let Some(url) = remote.url() {
                return Ok(Some(url.to_string()));
            }
        }
        Ok(None)
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false)
            .include_ignored(false)
            .exclude_submodules(true);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses.iter().any(|entry| entry.status() != Status::CURRENT))
    }
}

impl RepoBackend for GitBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Git
    }

    fn open(&self, path: &NormalizedPath) -> Result<Box<dyn WorkingCopy>> {
        let repo = Repository::open(path.to_native()).map_err(|e| Error::NotAWorkingCopy {
            path: path.to_native(),
            message: e.message().to_string(),
        })?;
        Ok(Box::new(GitWorkingCopy::new(path, repo)?))
    }

    fn clone_remote(
        &self,
        remote: &str,
        destination: &NormalizedPath,
    ) -> Result<Box<dyn WorkingCopy>> {
        tracing::info!(remote = %remote, destination = %destination, "Cloning");
        let repo = Repository::clone(remote, destination.to_native()).map_err(|e| {
            Error::CloneFailed {
                remote: remote.to_string(),
                path: destination.to_native(),
                message: e.message().to_string(),
            }
        })?;
        Ok(Box::new(GitWorkingCopy::new(destination, repo)?))
    }
}
