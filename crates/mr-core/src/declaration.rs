//! Repository declarations

use std::collections::BTreeMap;

use mr_git::BackendType;
use serde::{Deserialize, Serialize};

/// Declarations keyed by repository name, kept sorted by name.
pub type Declarations = BTreeMap<String, RepositoryDeclaration>;

/// One tracked repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDeclaration {
    /// Backend tag, `Git` for every repository this tool creates
    #[serde(rename = "type")]
    pub backend_type: BackendType,

    /// Remote the repository is cloned from, absent without a remote
    #[serde(rename = "remote", default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Location relative to the registry root, defaults to the name
    #[serde(rename = "path", default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
}

impl RepositoryDeclaration {
    pub fn new(backend_type: BackendType) -> Self {
        Self {
            backend_type,
            remote_url: None,
            relative_path: None,
        }
    }

    pub fn with_remote(mut self, remote_url: impl Into<String>) -> Self {
        self.remote_url = Some(remote_url.into());
        self
    }

    pub fn with_path(mut self, relative_path: impl Into<String>) -> Self {
        self.relative_path = Some(relative_path.into());
        self
    }

    /// Path of the working copy relative to the registry root.
    pub fn path_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.relative_path.as_deref().unwrap_or(name)
    }

    /// `key: value` metadata shown by `list`, excluding the type.
    pub fn metadata(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if let Some(remote) = &self.remote_url {
            fields.push(format!("remote: {remote}"));
        }
        if let Some(path) = &self.relative_path {
            fields.push(format!("path: {path}"));
        }
        fields
    }
}
