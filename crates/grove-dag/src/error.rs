//! Error types for commit graph queries.

use grove_store::StoreError;
use grove_types::ObjectId;

/// Errors that can occur while walking the commit graph.
///
/// The graph is read-only, so every failure comes from loading a commit: a
/// dangling parent surfaces as `ObjectNotFound`, a digest naming a blob or
/// tree as `MalformedObject`.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// Loading a commit from the object store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DagError {
    /// The digest that could not be found, if this is a missing-object error.
    pub fn missing_object(&self) -> Option<ObjectId> {
        match self {
            Self::Store(StoreError::ObjectNotFound(id)) => Some(*id),
            Self::Store(_) => None,
        }
    }
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
