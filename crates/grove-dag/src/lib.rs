//! Commit graph for grove.
//!
//! A read-only view over the commits in an object store. Supports ancestry
//! queries (reachability, lowest common ancestors) and newest-first history
//! enumeration, all driven by explicit frontiers rather than recursion.

pub mod error;
pub mod graph;
pub mod node;

pub use error::{DagError, DagResult};
pub use graph::{Ancestors, CommitGraph, History};
pub use node::CommitNode;
