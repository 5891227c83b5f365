//! Registry reconciliation for Mr. Repo
//!
//! A registry root holds two documents: the declarations (every tracked
//! repository with its backend type, remote and relative path) and the
//! presence list (the declared names whose working copy exists on disk).
//! This crate keeps the two consistent across commands:
//!
//! ```text
//!        command::run
//!              |
//!         Reconciler ---- scanner::find_repos
//!          |       |
//!   RegistryStore  mr-git backends
//!          |
//!        mr-fs
//! ```
//!
//! One [`Reconciler`] is opened per command. It loads both documents,
//! performs a single operation in memory and persists both documents as
//! its last step.

pub mod command;
pub mod declaration;
pub mod error;
pub mod presence;
pub mod reconciler;
pub mod scanner;
pub mod store;

pub use command::{Command, Invocation, ListFilter, run};
pub use declaration::{Declarations, RepositoryDeclaration};
pub use error::{Error, Result};
pub use presence::Presence;
pub use reconciler::Reconciler;
pub use scanner::{DEFAULT_MAX_DEPTH, find_repos};
pub use store::{DocumentCheck, RegistryFiles, RegistryState, RegistryStore, ValidationReport};
