//! Well-known file and directory names.

use std::path::Path;

/// Files and directories with a fixed meaning inside a registry root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFile {
    /// Default declarations document (`.mr_repo.yml`)
    Declarations,
    /// Default presence list (`.this_repo`)
    Presence,
    /// Git metadata directory inside a working copy (`.git`)
    GitDir,
}

impl RegistryFile {
    /// Get the string representation of the name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Declarations => ".mr_repo.yml",
            Self::Presence => ".this_repo",
            Self::GitDir => ".git",
        }
    }

    /// Whether `name` is a version-control metadata directory that
    /// should never be treated as a working copy of its own.
    pub fn is_metadata_dir(name: &str) -> bool {
        name == Self::GitDir.as_str()
    }
}

impl AsRef<Path> for RegistryFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for RegistryFile {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for RegistryFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
