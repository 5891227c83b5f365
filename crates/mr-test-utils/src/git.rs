//! Git working-copy fixtures.
//!
//! Everything goes through `git2` so tests do not depend on a `git`
//! executable or on the user's global git configuration.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Repository, Signature};

/// Initialises an empty working copy (no commits, no remotes).
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn init_repo(path: &Path) -> Repository {
    Repository::init(path).unwrap_or_else(|e| {
        panic!("init_repo: failed to init repository at {}: {e}", path.display())
    })
}

/// Initialises a working copy with `README.md` committed on its default
/// branch.
///
/// # Panics
/// Panics if any git operation fails.
pub fn init_repo_with_commit(path: &Path) -> Repository {
    let repo = init_repo(path);
    fs::write(path.join("README.md"), "# Test\n")
        .unwrap_or_else(|e| panic!("init_repo_with_commit: failed to write README.md: {e}"));
    commit_all(&repo, "Initial commit");
    repo
}

/// Stages every file in the working tree and commits it.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_all(repo: &Repository, message: &str) {
    let mut index = repo.index().expect("commit_all: index");
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .expect("commit_all: add_all");
    index.write().expect("commit_all: write index");
    let tree_id = index.write_tree().expect("commit_all: write_tree");
    let tree = repo.find_tree(tree_id).expect("commit_all: find_tree");

    let sig = Signature::now("Test User", "test@test.com").expect("commit_all: signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("commit_all: commit");
}

/// Adds a remote called `name` pointing at `url`.
///
/// # Panics
/// Panics if the remote cannot be created.
pub fn add_remote(repo: &Repository, name: &str, url: &str) {
    repo.remote(name, url)
        .unwrap_or_else(|e| panic!("add_remote: failed to add {name} -> {url}: {e}"));
}

/// Modifies the committed `README.md` so the working copy reports dirty.
///
/// # Panics
/// Panics if the file cannot be written.
pub fn make_dirty(path: &Path) {
    fs::write(path.join("README.md"), "# Test\n\nuncommitted change\n")
        .unwrap_or_else(|e| panic!("make_dirty: failed to modify README.md: {e}"));
}

/// Creates `levels` nested directories below `root` named
/// `{prefix}1/{prefix}2/...` and returns the innermost one.
///
/// # Panics
/// Panics if a directory cannot be created.
pub fn nested_dirs(root: &Path, levels: usize, prefix: &str) -> PathBuf {
    let mut current = root.to_path_buf();
    for level in 1..=levels {
        current = current.join(format!("{prefix}{level}"));
    }
    fs::create_dir_all(&current)
        .unwrap_or_else(|e| panic!("nested_dirs: failed to create {}: {e}", current.display()));
    current
}
