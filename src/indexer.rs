//! Workspace indexing: discover locale files and load them into a catalog.

pub mod types;
pub mod workspace;

pub use types::{
    IndexerError,
    LoadFailure,
    WorkspaceIndex,
};
pub use workspace::WorkspaceIndexer;
