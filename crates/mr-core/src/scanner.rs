//! Depth-bounded discovery of working copies below a directory

use std::fs;

use mr_fs::{NormalizedPath, RegistryFile};
use mr_git::Backend;

use crate::{Error, Result};

/// How many directory levels below the immediate children are searched.
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Find working copies below `start_path`.
///
/// Immediate subdirectories of `start_path` are tested first; a directory
/// that is a working copy is recorded and never descended into, any other
/// directory is searched while depth budget remains. Symbolic links to
/// directories are followed. Results are in directory-name order per level.
pub fn find_repos(start_path: &NormalizedPath, max_depth: usize) -> Result<Vec<NormalizedPath>> {
    find_repos_with(start_path, max_depth, Backend::is_working_copy)
}

/// [`find_repos`] with a caller-supplied working-copy test.
pub fn find_repos_with<F>(
    start_path: &NormalizedPath,
    max_depth: usize,
    is_working_copy: F,
) -> Result<Vec<NormalizedPath>>
where
    F: Fn(&NormalizedPath) -> bool,
{
    let mut found = Vec::new();
    let children = subdirectories(start_path)?;
    scan(children, max_depth, &is_working_copy, &mut found);
    Ok(found)
}

fn scan<F>(
    children: Vec<NormalizedPath>,
    remaining: usize,
    is_working_copy: &F,
    found: &mut Vec<NormalizedPath>,
) where
    F: Fn(&NormalizedPath) -> bool,
{
    for child in children {
        if is_working_copy(&child) {
            tracing::debug!(path = %child, "Found working copy");
            found.push(child);
            continue;
        }
        if remaining == 0 {
            continue;
        }
        match subdirectories(&child) {
            Ok(grandchildren) => scan(grandchildren, remaining - 1, is_working_copy, found),
            Err(e) => tracing::warn!(path = %child, error = %e, "Skipping unreadable directory"),
        }
    }
}

/// Subdirectories of `dir` sorted by name, excluding VCS metadata.
fn subdirectories(dir: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
    let native = dir.to_native();
    let entries = fs::read_dir(&native).map_err(|e| Error::Fs(mr_fs::Error::io(&native, e)))?;

    let mut names: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::Fs(mr_fs::Error::io(&native, e)))?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::warn!(dir = %dir, name = ?raw, "Skipping entry with a non-UTF-8 name");
                continue;
            }
        };
        if RegistryFile::is_metadata_dir(&name) {
            continue;
        }
        // `is_dir` follows symbolic links
        if dir.join(&name).is_dir() {
            names.push(name);
        }
    }
    names.sort();

    Ok(names.into_iter().map(|name| dir.join(&name)).collect())
}
