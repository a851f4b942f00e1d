//! Error types for the merge engine.
//!
//! Conflicts are not errors; see [`crate::MergeOutcome`].

use grove_dag::DagError;
use grove_store::StoreError;
use grove_types::ObjectId;

/// Fatal merge failures. Nothing is committed when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The two commits share no history.
    #[error("no common ancestor between {ours} and {theirs}")]
    NoCommonAncestor { ours: ObjectId, theirs: ObjectId },

    /// Reading or writing an object failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Walking the commit graph failed.
    #[error("commit graph error: {0}")]
    Dag(#[from] DagError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
