//! Registry store: the declarations document and the presence list
//!
//! Both documents live directly in the registry root. They are read in
//! full on [`RegistryStore::load`] and rewritten in full on
//! [`RegistryStore::save`]; no file handle outlives either call.

use std::fmt;
use std::path::Path;

use mr_fs::{ConfigStore, NormalizedPath, RegistryFile, io};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Declarations, Error, Presence, Result};

/// File names of the two registry documents, relative to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryFiles {
    /// Declarations document; its extension selects YAML, JSON or TOML
    pub declarations: String,
    /// Presence list
    pub presence: String,
}

impl Default for RegistryFiles {
    fn default() -> Self {
        Self {
            declarations: RegistryFile::Declarations.as_str().to_string(),
            presence: RegistryFile::Presence.as_str().to_string(),
        }
    }
}

/// In-memory copy of both documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryState {
    pub declarations: Declarations,
    pub presence: Presence,
}

impl RegistryState {
    pub fn is_declared(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.presence.contains(name)
    }
}

#[derive(Debug, Default, Deserialize)]
struct DeclarationsDocument {
    #[serde(default)]
    repos: Option<Declarations>,
}

#[derive(Serialize)]
struct DeclarationsDocumentRef<'a> {
    repos: &'a Declarations,
}

/// Handle on the two documents of one registry root.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    root: NormalizedPath,
    files: RegistryFiles,
    declarations_path: NormalizedPath,
    presence_path: NormalizedPath,
    config: ConfigStore,
}

impl RegistryStore {
    /// Open the registry rooted at `root`.
    ///
    /// Unless `is_init` is set the declarations document must already
    /// exist. Missing documents are then created empty.
    ///
    /// # Errors
    ///
    /// [`Error::NotADirectory`] when `root` is not a directory,
    /// [`Error::NotARegistry`] when it holds no declarations document and
    /// this is not an `init`.
    pub fn open(root: impl AsRef<Path>, is_init: bool, files: &RegistryFiles) -> Result<Self> {
        let root = NormalizedPath::new(root.as_ref()).absolutize()?;
        if !root.is_dir() {
            return Err(Error::NotADirectory {
                path: root.to_native(),
            });
        }

        let declarations_path = follow_link(&root.join(&files.declarations));
        if !is_init && !declarations_path.is_file() {
            return Err(Error::NotARegistry {
                path: root.to_native(),
            });
        }
        let presence_path = follow_link(&root.join(&files.presence));

        io::ensure_file(&declarations_path)?;
        io::ensure_file(&presence_path)?;

        tracing::debug!(root = %root, "Opened registry");
        Ok(Self {
            root,
            files: files.clone(),
            declarations_path,
            presence_path,
            config: ConfigStore::new(),
        })
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn files(&self) -> &RegistryFiles {
        &self.files
    }

    pub fn declarations_path(&self) -> &NormalizedPath {
        &self.declarations_path
    }

    pub fn presence_path(&self) -> &NormalizedPath {
        &self.presence_path
    }

    /// Read both documents.
    ///
    /// Presence entries that are not declared are dropped with a warning.
    pub fn load(&self) -> Result<RegistryState> {
        let declarations = self.read_declarations()?;
        let mut presence = Presence::parse(&io::read_text(&self.presence_path)?);

        let stale = presence.retain_declared(&declarations);
        if !stale.is_empty() {
            tracing::warn!(
                entries = ?stale,
                file = %self.files.presence,
                "Ignoring presence entries without a declaration"
            );
        }

        Ok(RegistryState {
            declarations,
            presence,
        })
    }

    /// Rewrite both documents from `state`.
    pub fn save(&self, state: &RegistryState) -> Result<()> {
        let document = DeclarationsDocumentRef {
            repos: &state.declarations,
        };
        self.config.save(&self.declarations_path, &document)?;
        io::write_text(&self.presence_path, &state.presence.render())?;

        tracing::debug!(
            declarations = state.declarations.len(),
            present = state.presence.len(),
            "Saved registry"
        );
        Ok(())
    }

    fn read_declarations(&self) -> Result<Declarations> {
        let text = io::read_text(&self.declarations_path)?;
        if text.trim().is_empty() {
            return Ok(Declarations::new());
        }
        let document: DeclarationsDocument = self.config.parse(&self.declarations_path, &text)?;
        Ok(document.repos.unwrap_or_default())
    }

    /// Validate the structure of both documents without failing.
    ///
    /// The declarations document must be a mapping whose `repos` entry maps
    /// names to objects with a string `type`. The presence list must be
    /// UTF-8 text with one declared name per line.
    pub fn check(&self) -> ValidationReport {
        let (declarations, names) = self.check_declarations();
        let presence = self.check_presence(names.as_deref());
        ValidationReport {
            declarations: (self.files.declarations.clone(), declarations),
            presence: (self.files.presence.clone(), presence),
        }
    }

    /// [`check`](Self::check) as a command result: the report on success,
    /// [`Error::InvalidDocuments`] otherwise.
    pub fn validate(&self) -> Result<String> {
        let report = self.check();
        if report.is_valid() {
            Ok(report.to_string())
        } else {
            Err(Error::InvalidDocuments { report })
        }
    }

    fn check_declarations(&self) -> (DocumentCheck, Option<Vec<String>>) {
        let text = match io::read_text(&self.declarations_path) {
            Ok(text) => text,
            Err(e) => return (DocumentCheck::invalid(e), None),
        };
        if text.trim().is_empty() {
            return (DocumentCheck::Valid, Some(Vec::new()));
        }
        let value: Value = match self.config.parse(&self.declarations_path, &text) {
            Ok(value) => value,
            Err(e) => return (DocumentCheck::invalid(e), None),
        };

        let repos = match &value {
            Value::Object(document) => match document.get("repos") {
                None | Some(Value::Null) => return (DocumentCheck::Valid, Some(Vec::new())),
                Some(Value::Object(repos)) => repos,
                Some(_) => return (DocumentCheck::invalid("`repos` is not a mapping"), None),
            },
            _ => return (DocumentCheck::invalid("document is not a mapping"), None),
        };

        let problems: Vec<String> = repos
            .iter()
            .filter_map(|(name, entry)| check_entry(entry).map(|p| format!("{name}: {p}")))
            .collect();

        if problems.is_empty() {
            (DocumentCheck::Valid, Some(repos.keys().cloned().collect()))
        } else {
            (DocumentCheck::invalid(problems.join(", ")), None)
        }
    }

    fn check_presence(&self, declared: Option<&[String]>) -> DocumentCheck {
        let bytes = match std::fs::read(self.presence_path.to_native()) {
            Ok(bytes) => bytes,
            Err(e) => return DocumentCheck::invalid(e),
        };
        let Ok(text) = String::from_utf8(bytes) else {
            return DocumentCheck::invalid("not valid UTF-8 text");
        };

        let mut problems = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let name = line.trim_end();
            if name.is_empty() {
                problems.push(format!("blank line {}", idx + 1));
            } else if seen.contains(&name) {
                problems.push(format!("duplicate entry '{name}'"));
            } else {
                seen.push(name);
            }
        }

        if let Some(declared) = declared {
            let orphans: Vec<&str> = seen
                .iter()
                .copied()
                .filter(|name| !declared.iter().any(|d| d == name))
                .collect();
            if !orphans.is_empty() {
                problems.push(format!("not declared: {}", orphans.join(", ")));
            }
        }

        if problems.is_empty() {
            DocumentCheck::Valid
        } else {
            DocumentCheck::invalid(problems.join(", "))
        }
    }
}

fn check_entry(entry: &Value) -> Option<String> {
    let Value::Object(fields) = entry else {
        return Some("entry is not a mapping".into());
    };
    match fields.get("type") {
        Some(Value::String(_)) => {}
        Some(_) => return Some("`type` is not a string".into()),
        None => return Some("`type` is missing".into()),
    }
    for key in ["remote", "path"] {
        if let Some(value) = fields.get(key)
            && !value.is_string()
        {
            return Some(format!("`{key}` is not a string"));
        }
    }
    None
}

/// Resolve a document path that is a symbolic link to its target so that
/// atomic rewrites replace the target rather than the link.
fn follow_link(path: &NormalizedPath) -> NormalizedPath {
    let native = path.to_native();
    let is_link = std::fs::symlink_metadata(&native)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if !is_link {
        return path.clone();
    }
    match std::fs::read_link(&native) {
        Ok(target) if target.is_absolute() => NormalizedPath::new(target),
        Ok(target) => path
            .parent()
            .map(|parent| parent.join(&target.to_string_lossy()))
            .unwrap_or_else(|| NormalizedPath::new(target)),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Could not read document link");
            path.clone()
        }
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentCheck {
    Valid,
    Invalid { reason: String },
}

impl DocumentCheck {
    fn invalid(reason: impl ToString) -> Self {
        Self::Invalid {
            reason: reason.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for DocumentCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("ok"),
            Self::Invalid { reason } => write!(f, "invalid ({reason})"),
        }
    }
}

/// Per-document validation result, each paired with its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub declarations: (String, DocumentCheck),
    pub presence: (String, DocumentCheck),
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.declarations.1.is_valid() && self.presence.1.is_valid()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}; {}: {}",
            self.declarations.0, self.declarations.1, self.presence.0, self.presence.1
        )
    }
}
