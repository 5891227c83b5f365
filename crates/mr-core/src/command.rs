//! Typed command arguments and dispatch

use std::path::PathBuf;

use crate::{Reconciler, RegistryFiles, RegistryStore, Result};

/// Which declarations `list` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    /// Declared and checked out
    #[default]
    Present,
    /// Every declaration
    All,
    /// Declared but not checked out
    Unavailable,
}

/// One registry operation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init { clean: bool },
    List { filter: ListFilter },
    Add { path: PathBuf },
    Rm { name: String },
    Get { name: String },
    Unget { name: String, force: bool },
    Update,
    Check,
}

impl Command {
    /// Whether the command may run on a root that is not yet a registry.
    pub fn is_init(&self) -> bool {
        matches!(self, Command::Init { .. })
    }
}

/// A fully resolved request: where the registry lives and what to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub root: PathBuf,
    pub files: RegistryFiles,
    pub command: Command,
}

impl Invocation {
    /// Invocation against a registry using the default document names.
    pub fn new(root: impl Into<PathBuf>, command: Command) -> Self {
        Self {
            root: root.into(),
            files: RegistryFiles::default(),
            command,
        }
    }
}

/// Open the registry, run one command and return its message.
pub fn run(invocation: Invocation) -> Result<String> {
    let Invocation {
        root,
        files,
        command,
    } = invocation;
    tracing::debug!(root = %root.display(), command = ?command, "Running command");

    // Validation must not depend on the documents being loadable
    if command == Command::Check {
        return RegistryStore::open(&root, false, &files)?.validate();
    }

    let mut reconciler = Reconciler::open(&root, command.is_init(), &files)?;
    match command {
        Command::Init { clean } => reconciler.init(clean),
        Command::List { filter } => Ok(reconciler.list(filter)),
        Command::Add { path } => reconciler.add(&path),
        Command::Rm { name } => reconciler.rm(&name),
        Command::Get { name } => reconciler.get(&name),
        Command::Unget { name, force } => reconciler.unget(&name, force),
        Command::Update => reconciler.update(),
        Command::Check => reconciler.check(),
    }
}
