//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A lexically cleaned path that uses forward slashes internally.
///
/// Backslashes are converted to forward slashes, `.` segments and repeated
/// separators are dropped and `..` is resolved against the preceding
/// segment where one exists. Conversion back to a platform-native
/// [`PathBuf`] happens only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str.replace('\\', "/")),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Whether the path starts at the filesystem root.
    pub fn is_absolute(&self) -> bool {
        self.inner.starts_with('/') || self.to_native().is_absolute()
    }

    /// Join this path with a segment.
    ///
    /// An absolute segment replaces the path, as with [`Path::join`].
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        if segment.starts_with('/') {
            return Self::new(segment);
        }
        Self::new(format!("{}/{}", self.inner, segment))
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            _ => None,
        }
    }

    /// Get the final path component.
    ///
    /// Returns `None` for the filesystem root, `.` and paths ending in `..`.
    pub fn file_name(&self) -> Option<&str> {
        let name = self.inner.rsplit('/').next()?;
        match name {
            "" | "." | ".." => None,
            name => Some(name),
        }
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory. Symbolic links are followed.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Resolve a relative path against the process working directory.
    pub fn absolutize(&self) -> Result<Self> {
        if self.is_absolute() {
            return Ok(self.clone());
        }
        let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
        Ok(Self::new(cwd).join(&self.inner))
    }

    /// Resolve symbolic links, producing an absolute path.
    pub fn canonicalize(&self) -> Result<Self> {
        let native = self.to_native();
        dunce::canonicalize(&native)
            .map(Self::new)
            .map_err(|e| Error::io(native, e))
    }

    /// Express this path relative to `base`.
    ///
    /// Both paths must be of the same kind (absolute or relative). The
    /// result contains leading `..` segments when `self` is not inside
    /// `base`, and is `.` when the paths are equal.
    pub fn relative_to(&self, base: &NormalizedPath) -> Option<Self> {
        if self.is_absolute() != base.is_absolute() {
            return None;
        }

        let ours: Vec<&str> = segments(&self.inner).collect();
        let theirs: Vec<&str> = segments(&base.inner).collect();
        let common = ours
            .iter()
            .zip(theirs.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = vec![".."; theirs.len() - common];
        parts.extend_from_slice(&ours[common..]);
        Some(Self::new(parts.join("/")))
    }

    /// Whether this path lies inside `base` (or equals it).
    pub fn starts_with(&self, base: &NormalizedPath) -> bool {
        self.relative_to(base)
            .is_some_and(|rel| rel.inner != ".." && !rel.inner.starts_with("../"))
    }
}

/// Non-empty segments of a cleaned path, ignoring the `.` placeholder.
fn segments(inner: &str) -> impl Iterator<Item = &str> {
    inner.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// Lexically normalize a forward-slash path.
fn clean(raw: &str) -> String {
    let absolute = raw.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // `..` above the root stays at the root
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let body = parts.join("/");
    if absolute {
        format!("/{body}")
    } else if body.is_empty() {
        ".".to_string()
    } else {
        body
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
