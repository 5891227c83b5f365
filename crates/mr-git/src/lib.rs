//! Version-control backends for Mr. Repo
//!
//! A backend knows how to recognise, inspect and clone working copies of
//! one version-control system. The set of supported systems is closed:
//! [`Backend`] enumerates them and [`BackendType`] is the tag stored in the
//! declarations document.

pub mod backend;
pub mod error;
pub mod git;

pub use backend::{Backend, BackendType, RepoBackend, WorkingCopy};
pub use error::{Error, Result};
pub use git::GitBackend;
