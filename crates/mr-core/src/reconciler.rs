//! Command operations over one opened registry
//!
//! Every operation validates first and only then touches the in-memory
//! state; operations that change anything persist both documents as their
//! final step. Business-rule failures leave the documents untouched.

use std::path::Path;

use mr_fs::{NormalizedPath, io};
use mr_git::{Backend, RepoBackend};

use crate::{
    DEFAULT_MAX_DEPTH, Error, ListFilter, RegistryFiles, RegistryState, RegistryStore,
    RepositoryDeclaration, Result, scanner,
};

/// Applies commands to the state of one registry.
#[derive(Debug)]
pub struct Reconciler {
    store: RegistryStore,
    state: RegistryState,
}

impl Reconciler {
    /// Wrap an opened store and its loaded state.
    pub fn new(store: RegistryStore, state: RegistryState) -> Self {
        Self { store, state }
    }

    /// Open the registry at `root` and load it.
    ///
    /// For `init` the existing documents are not read: initialisation
    /// starts from a blank state.
    pub fn open(root: impl AsRef<Path>, is_init: bool, files: &RegistryFiles) -> Result<Self> {
        let store = RegistryStore::open(root, is_init, files)?;
        let state = if is_init {
            RegistryState::default()
        } else {
            store.load()?
        };
        Ok(Self::new(store, state))
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    /// Initialise the registry, seeding it from the directory tree unless
    /// `clean` is set.
    pub fn init(&mut self, clean: bool) -> Result<String> {
        if !clean {
            let summary = self.discover()?;
            tracing::info!("{summary}");
        }
        self.persist()?;
        Ok(format!(
            "Successfully initialized Mr. Repo at '{}'.",
            self.store.root()
        ))
    }

    /// Declare the existing working copy at `path`.
    ///
    /// The name is the final component of the path relative to the
    /// registry root. A taken name is reported before the path is checked
    /// for a working copy.
    pub fn add(&mut self, path: &Path) -> Result<String> {
        let message = self.register(path)?;
        self.persist()?;
        Ok(message)
    }

    /// Forget the declaration of `name`. Nothing on disk is removed.
    pub fn rm(&mut self, name: &str) -> Result<String> {
        let name = self.declared_name(name)?;

        self.state.declarations.remove(&name);
        self.state.presence.remove(&name);
        self.persist()?;

        Ok(format!("Successfully removed '{name}' from Mr. Repo control."))
    }

    /// Clone the declared repository `name` into its relative path.
    pub fn get(&mut self, name: &str) -> Result<String> {
        let name = self.declared_name(name)?;
        let declaration = &self.state.declarations[&name];

        let remote = declaration
            .remote_url
            .clone()
            .ok_or_else(|| Error::NoRemote { name: name.clone() })?;
        let backend = backend_for(declaration)?;
        let destination = self.store.root().join(declaration.path_or(&name));

        let copy = backend
            .clone_remote(&remote, &destination)
            .map_err(|source| Error::CloneFailure {
                name: name.clone(),
                source,
            })?;

        self.state.presence.insert(&name);
        self.persist()?;

        Ok(format!(
            "Successfully cloned '{name}' into '{}'.",
            copy.path()
        ))
    }

    /// Delete the working copy of `name` from disk.
    ///
    /// The path must be strictly inside the registry root and open as a
    /// working copy of the declared backend, even with `force`. A dirty
    /// working copy is kept unless `force` is set.
    pub fn unget(&mut self, name: &str, force: bool) -> Result<String> {
        let name = repo_name(name);
        if !(self.state.is_declared(&name) && self.state.is_present(&name)) {
            return Err(Error::NotCheckedOut { name });
        }

        let declaration = &self.state.declarations[&name];
        let backend = backend_for(declaration)?;
        let path = self.removable_path(declaration.path_or(&name))?;

        if path.exists() {
            let copy = backend
                .open(&path)
                .map_err(|_| Error::UnsupportedRepository {
                    path: path.to_native(),
                })?;
            if !force && copy.is_dirty()? {
                return Err(Error::DirtyWorkingCopy { name });
            }
            drop(copy);
            io::remove_tree(&path)?;
            tracing::info!(name = %name, path = %path, "Removed working copy");
        } else {
            tracing::warn!(name = %name, path = %path, "Working copy already missing");
        }

        self.state.presence.remove(&name);
        self.persist()?;

        Ok(format!("Successfully removed the local copy of '{name}'."))
    }

    /// One line per declaration matching `filter`.
    ///
    /// Names are padded to the longest listed name. Never writes.
    pub fn list(&self, filter: ListFilter) -> String {
        let entries: Vec<(&String, &RepositoryDeclaration)> = self
            .state
            .declarations
            .iter()
            .filter(|(name, _)| match filter {
                ListFilter::Present => self.state.is_present(name),
                ListFilter::All => true,
                ListFilter::Unavailable => !self.state.is_present(name),
            })
            .collect();

        let width = entries
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0);

        entries
            .iter()
            .map(|(name, declaration)| {
                let metadata = declaration.metadata();
                let mut line = format!("{name:<width$} - [{}]", declaration.backend_type);
                if !metadata.is_empty() {
                    line.push(' ');
                    line.push_str(&metadata.join(", "));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Declare every undeclared working copy found below the root.
    pub fn update(&mut self) -> Result<String> {
        let summary = self.discover()?;
        self.persist()?;
        Ok(summary)
    }

    /// Validate both documents.
    pub fn check(&self) -> Result<String> {
        self.store.validate()
    }

    fn discover(&mut self) -> Result<String> {
        let before = self.state.presence.len() as i64;
        let found = scanner::find_repos(self.store.root(), DEFAULT_MAX_DEPTH)?;

        for path in found {
            if let Some(name) = path.file_name()
                && self.state.is_declared(name)
            {
                tracing::debug!(name = %name, "Already declared");
                continue;
            }
            match self.register(path.as_ref()) {
                Ok(message) => tracing::debug!("{message}"),
                Err(e) if e.is_business_rule() => {
                    tracing::warn!(path = %path, error = %e, "Skipping discovered working copy");
                }
                Err(e) => return Err(e),
            }
        }

        let difference = self.state.presence.len() as i64 - before;
        Ok(match difference {
            d if d > 0 => format!("Successfully added {d} new repositories."),
            d if d < 0 => format!("Successfully removed {} repositories.", -d),
            _ => "No updates made to controlled repos.".to_string(),
        })
    }

    /// Record a declaration for the working copy at `path` in memory.
    fn register(&mut self, path: &Path) -> Result<String> {
        let target = NormalizedPath::new(path).absolutize()?;
        let relative = self.relative_to_root(&target);
        let unsupported = || Error::UnsupportedRepository {
            path: path.to_path_buf(),
        };

        let name = relative.file_name().ok_or_else(unsupported)?.to_string();
        if self.state.is_declared(&name) {
            return Err(Error::AlreadyDeclared {
                name,
                file: self.store.files().declarations.clone(),
            });
        }

        let (backend, copy) = Backend::detect(&target).ok_or_else(unsupported)?;
        let mut declaration =
            RepositoryDeclaration::new(backend.backend_type()).with_path(relative.as_str());
        declaration.remote_url = copy.remote_url()?;

        tracing::debug!(name = %name, declaration = ?declaration, "Adding declaration");
        self.state.declarations.insert(name.clone(), declaration);
        self.state.presence.insert(&name);

        Ok(format!("Successfully added '{name}' to Mr. Repo."))
    }

    /// Path of `target` relative to the root, resolving symbolic links
    /// when the lexical form leaves the root.
    fn relative_to_root(&self, target: &NormalizedPath) -> NormalizedPath {
        let root = self.store.root();
        if target.starts_with(root)
            && let Some(relative) = target.relative_to(root)
        {
            return relative;
        }
        if let (Ok(target), Ok(root)) = (target.canonicalize(), root.canonicalize())
            && target.starts_with(&root)
            && let Some(relative) = target.relative_to(&root)
        {
            return relative;
        }
        target.relative_to(root).unwrap_or_else(|| target.clone())
    }

    /// Absolute path of a declared relative path, refused unless it lies
    /// strictly below the registry root.
    fn removable_path(&self, relative: &str) -> Result<NormalizedPath> {
        let root = self.store.root();
        let path = root.join(relative);
        let refuse = || Error::UnsupportedRepository {
            path: path.to_native(),
        };

        if path == *root || !path.starts_with(root) {
            return Err(refuse());
        }
        // A link back to the root is the root
        if let (Ok(resolved), Ok(resolved_root)) = (path.canonicalize(), root.canonicalize())
            && resolved == resolved_root
        {
            return Err(refuse());
        }
        Ok(path)
    }

    /// Resolve a name argument to a declared name.
    fn declared_name(&self, name: &str) -> Result<String> {
        let name = repo_name(name);
        if self.state.is_declared(&name) {
            Ok(name)
        } else {
            Err(Error::UnknownRepository { name })
        }
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.state)?;
        tracing::info!(root = %self.store.root(), "Registry updated");
        Ok(())
    }
}

/// Reduce a name argument to its final path component.
fn repo_name(name: &str) -> String {
    NormalizedPath::new(name)
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string())
}

fn backend_for(declaration: &RepositoryDeclaration) -> Result<Backend> {
    Backend::for_type(&declaration.backend_type).ok_or_else(|| Error::UnsupportedBackend {
        kind: declaration.backend_type.clone(),
    })
}
