//! [`TestRegistry`] scratch registry root.

use std::fs;
use std::path::{Path, PathBuf};

use git2::Repository;
use tempfile::TempDir;

use crate::git;

/// Name of the declarations document in a default registry.
pub const DECLARATIONS_FILE: &str = ".mr_repo.yml";

/// Name of the presence list in a default registry.
pub const PRESENCE_FILE: &str = ".this_repo";

/// A temporary registry root with helpers for populating it.
///
/// Remotes live in a second temporary directory so that cloning them
/// never touches the registry itself.
///
/// # Example
///
/// ```rust,no_run
/// use mr_test_utils::registry::TestRegistry;
///
/// let registry = TestRegistry::new();
/// registry.working_copy("Shoes");
/// registry.assert_exists("Shoes/.git");
/// ```
pub struct TestRegistry {
    root: TempDir,
    remotes: TempDir,
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRegistry {
    /// Create an empty registry root.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            remotes: TempDir::new().unwrap(),
        }
    }

    /// Root directory of the registry.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of `relative` inside the registry.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Create an empty working copy at `relative`.
    pub fn working_copy(&self, relative: &str) -> Repository {
        let path = self.path(relative);
        fs::create_dir_all(&path).unwrap();
        git::init_repo(&path)
    }

    /// Create a working copy at `relative` with one commit.
    pub fn committed_working_copy(&self, relative: &str) -> Repository {
        let path = self.path(relative);
        fs::create_dir_all(&path).unwrap();
        git::init_repo_with_commit(&path)
    }

    /// Create a committed repository outside the registry and return a URL
    /// (a local path) that can be cloned from.
    pub fn remote(&self, name: &str) -> String {
        let path = self.remotes.path().join(name);
        fs::create_dir_all(&path).unwrap();
        git::init_repo_with_commit(&path);
        path.to_string_lossy().into_owned()
    }

    /// Create a working copy at `relative` whose `origin` is a fresh remote.
    ///
    /// Returns the remote URL.
    pub fn cloneable_working_copy(&self, relative: &str) -> String {
        let name = Path::new(relative)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative.to_string());
        let url = self.remote(&name);
        let repo = self.committed_working_copy(relative);
        git::add_remote(&repo, "origin", &url);
        url
    }

    /// Raw content of the presence list.
    pub fn presence_text(&self) -> String {
        fs::read_to_string(self.path(PRESENCE_FILE)).unwrap_or_default()
    }

    /// Names in the presence list, in file order.
    pub fn presence(&self) -> Vec<String> {
        self.presence_text().lines().map(str::to_string).collect()
    }

    /// Raw content of the declarations document.
    pub fn declarations_text(&self) -> String {
        fs::read_to_string(self.path(DECLARATIONS_FILE)).unwrap_or_default()
    }

    /// Assert that `relative` exists inside the registry.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            full_path.exists(),
            "Expected path to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `relative` does **not** exist inside the registry.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_not_exists(&self, relative: &str) {
        let full_path = self.path(relative);
        assert!(
            !full_path.exists(),
            "Expected path NOT to exist: {}",
            full_path.display()
        );
    }
}
