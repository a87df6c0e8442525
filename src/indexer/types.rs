//! Indexer type definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::Catalog;
use crate::config::MatcherError;
use crate::input::error::ResourceError;

/// A locale file that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: ResourceError,
}

/// Locale resources found in a workspace.
#[derive(Debug)]
pub struct WorkspaceIndex {
    pub catalog: Catalog,
    /// Files that made it into the catalog, sorted.
    pub loaded: Vec<PathBuf>,
    /// Files skipped because a resource for the same locale was already loaded.
    pub shadowed: Vec<PathBuf>,
    pub failures: Vec<LoadFailure>,
}

#[derive(Error, Debug)]
pub enum IndexerError {
    /// The workspace root is not a readable directory
    #[error("Workspace path is not a directory: {0}")]
    InvalidPath(PathBuf),
    /// A configured glob pattern is invalid
    #[error(transparent)]
    Matcher(#[from] MatcherError),
}
