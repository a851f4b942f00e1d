//! Tree-level diff: compare two trees and produce a list of changes.
//!
//! Subtrees are walked recursively and every change is reported at its full
//! slash-separated path. Entries are compared by name in a single sorted
//! merge walk, so changes come out ordered by path. Renames are not
//! detected: a moved file is a deletion plus an addition.

use std::cmp::Ordering;

use grove_store::{EntryMode, ObjectStore, Tree, TreeEntry};
use grove_types::ObjectId;
use tracing::trace;

use crate::error::DiffResult;

/// The result of comparing two trees.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// The list of changes between the old and new trees, ordered by path.
    pub changes: Vec<TreeChange>,
}

impl TreeDiff {
    /// Create an empty tree diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Paths touched by this diff, in order.
    pub fn paths(&self) -> Vec<&str> {
        self.changes.iter().map(TreeChange::path).collect()
    }
}

/// A single change between two trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeChange {
    /// A new file appeared.
    Added {
        path: String,
        new_id: ObjectId,
        mode: EntryMode,
    },
    /// A file disappeared.
    Deleted {
        path: String,
        old_id: ObjectId,
        mode: EntryMode,
    },
    /// A file's content changed (same path, different object ID).
    Modified {
        path: String,
        old_id: ObjectId,
        new_id: ObjectId,
        mode: EntryMode,
    },
    /// A file's mode changed but content is the same.
    ModeChanged {
        path: String,
        id: ObjectId,
        old_mode: EntryMode,
        new_mode: EntryMode,
    },
    /// A file became a directory or the other way round.
    TypeChanged {
        path: String,
        old: TreeEntry,
        new: TreeEntry,
    },
}

impl TreeChange {
    /// Path of the changed entry.
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path, .. }
            | Self::Deleted { path, .. }
            | Self::Modified { path, .. }
            | Self::ModeChanged { path, .. }
            | Self::TypeChanged { path, .. } => path,
        }
    }
}

/// Compare two trees and produce a recursive, path-flattened diff.
///
/// - `old_tree`: the previous tree (or `None` for an empty tree).
/// - `new_tree`: the current tree ID.
///
/// Both tree objects, and every differing subtree, are read from the store.
pub fn diff_trees(
    store: &dyn ObjectStore,
    old_tree: Option<&ObjectId>,
    new_tree: &ObjectId,
) -> DiffResult<TreeDiff> {
    let old = match old_tree {
        Some(id) => store.get_tree(id)?,
        None => Tree::empty(),
    };
    let new = store.get_tree(new_tree)?;

    let mut changes = Vec::new();
    diff_level(store, "", &old, &new, &mut changes)?;
    trace!(changes = changes.len(), "diffed trees");
    Ok(TreeDiff { changes })
}

/// Join a parent path and an entry name with `/`.
pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

fn diff_level(
    store: &dyn ObjectStore,
    prefix: &str,
    old: &Tree,
    new: &Tree,
    out: &mut Vec<TreeChange>,
) -> DiffResult<()> {
    let mut old_iter = old.entries.iter().peekable();
    let mut new_iter = new.entries.iter().peekable();

    loop {
        let order = match (old_iter.peek(), new_iter.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(o), Some(n)) => o.name.cmp(&n.name),
        };
        match order {
            Ordering::Less => {
                if let Some(entry) = old_iter.next() {
                    removed(store, prefix, entry, out)?;
                }
            }
            Ordering::Greater => {
                if let Some(entry) = new_iter.next() {
                    added(store, prefix, entry, out)?;
                }
            }
            Ordering::Equal => {
                if let (Some(o), Some(n)) = (old_iter.next(), new_iter.next()) {
                    changed(store, prefix, o, n, out)?;
                }
            }
        }
    }
    Ok(())
}

fn added(
    store: &dyn ObjectStore,
    prefix: &str,
    entry: &TreeEntry,
    out: &mut Vec<TreeChange>,
) -> DiffResult<()> {
    let path = join_path(prefix, &entry.name);
    if entry.is_tree() {
        let subtree = store.get_tree(&entry.object_id)?;
        return diff_level(store, &path, &Tree::empty(), &subtree, out);
    }
    out.push(TreeChange::Added {
        path,
        new_id: entry.object_id,
        mode: entry.mode,
    });
    Ok(())
}

fn removed(
    store: &dyn ObjectStore,
    prefix: &str,
    entry: &TreeEntry,
    out: &mut Vec<TreeChange>,
) -> DiffResult<()> {
    let path = join_path(prefix, &entry.name);
    if entry.is_tree() {
        let subtree = store.get_tree(&entry.object_id)?;
        return diff_level(store, &path, &subtree, &Tree::empty(), out);
    }
    out.push(TreeChange::Deleted {
        path,
        old_id: entry.object_id,
        mode: entry.mode,
    });
    Ok(())
}

fn changed(
    store: &dyn ObjectStore,
    prefix: &str,
    old: &TreeEntry,
    new: &TreeEntry,
    out: &mut Vec<TreeChange>,
) -> DiffResult<()> {
    if old.mode == new.mode && old.object_id == new.object_id {
        return Ok(());
    }
    let path = join_path(prefix, &old.name);

    match (old.is_tree(), new.is_tree()) {
        (true, true) => {
            let old_sub = store.get_tree(&old.object_id)?;
            let new_sub = store.get_tree(&new.object_id)?;
            diff_level(store, &path, &old_sub, &new_sub, out)?;
        }
        (false, false) if old.object_id == new.object_id => out.push(TreeChange::ModeChanged {
            path,
            id: old.object_id,
            old_mode: old.mode,
            new_mode: new.mode,
        }),
        (false, false) => out.push(TreeChange::Modified {
            path,
            old_id: old.object_id,
            new_id: new.object_id,
            mode: new.mode,
        }),
        _ => out.push(TreeChange::TypeChanged {
            path,
            old: old.clone(),
            new: new.clone(),
        }),
    }
    Ok(())
}
