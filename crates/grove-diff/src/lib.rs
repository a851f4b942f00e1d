//! Diff engine for grove.
//!
//! Computes line-level diffs between blob contents and recursive, path-level
//! diffs between trees. The line diff is the building block of the three-way
//! merge.
//!
//! # Key Types
//!
//! - [`DiffOp`] / [`diff_lines`] -- Myers line diff over byte lines
//! - [`BlobDiff`] / [`DiffHunk`] / [`DiffLine`] -- hunked blob diff with context
//! - [`TreeDiff`] / [`TreeChange`] -- recursive tree diff (no rename detection)

pub mod blob_diff;
pub mod error;
pub mod tree_diff;

pub use blob_diff::{
    diff_blobs, diff_lines, is_binary, split_lines, BlobDiff, DiffHunk, DiffLine, DiffOp,
    BINARY_SNIFF_LEN,
};
pub use error::{DiffError, DiffResult};
pub use tree_diff::{diff_trees, join_path, TreeChange, TreeDiff};
