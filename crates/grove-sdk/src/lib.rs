//! High-level API for grove.
//!
//! [`Grove`] ties the object store, commit graph, diff and merge crates
//! together behind one handle: repository creation and discovery, commits,
//! newest-first history, ancestry queries and three-way merges.

pub mod config;
pub mod error;
pub mod log;
pub mod repository;

pub use config::{CoreConfig, GroveConfig, MergeConfig, CONFIG_FILE, FORMAT_VERSION};
pub use error::{GroveError, GroveResult};
pub use log::{Log, LogEntry};
pub use repository::{Grove, GROVE_DIR};

// Re-export key types
pub use grove_diff::{BlobDiff, TreeChange, TreeDiff};
pub use grove_merge::{Conflict, ConflictKind, MergeOutcome};
pub use grove_store::{Blob, Commit, EntryMode, Object, Signature, Tree, TreeEntry};
pub use grove_types::ObjectId;
