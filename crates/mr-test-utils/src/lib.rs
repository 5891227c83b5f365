//! Shared test utilities for the Mr. Repo workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: git working-copy fixtures
//! - [`registry`]: [`registry::TestRegistry`] scratch registry root

pub mod git;
pub mod registry;
