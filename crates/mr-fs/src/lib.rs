//! Filesystem layer for Mr. Repo
//!
//! Provides forward-slash path handling, locked atomic writes and a
//! format-agnostic document store used by the registry.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::RegistryFile;
pub use error::{Error, Result};
pub use path::NormalizedPath;
