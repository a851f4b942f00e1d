//! Merge engine for grove.
//!
//! Merges two commits against their merge base. Text files changed on both
//! sides are merged line by line (diff3); everything that cannot be resolved
//! automatically is collected as a [`Conflict`] and returned as data. A merge
//! commit is written only when there are no conflicts.

pub mod conflict;
pub mod engine;
pub mod error;
pub mod merge3;

pub use conflict::{Conflict, ConflictKind};
pub use engine::{MergeEngine, MergeOutcome, MergePhase, TreeMergeOutcome};
pub use error::{MergeError, MergeResult};
pub use merge3::{merge_lines, LineMerge, MergeLabels, MergeOptions, DEFAULT_MARKER_SIZE};
