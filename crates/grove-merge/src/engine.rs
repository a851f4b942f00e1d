//! Three-way tree merge and merge-commit creation.
//!
//! A merge runs through a fixed sequence of phases:
//!
//! ```text
//! Start -> ComputingBase -> DiffingTrees -> Resolving -> Clean -> NewCommit
//!                                                    \-> Conflicted
//! ```
//!
//! The three trees are walked in lock-step by entry name. Per path, with
//! "same" meaning same mode and same digest:
//!
//! - ours and theirs agree: take it (this covers "unchanged on both sides")
//! - only one side differs from the base: take that side
//! - both sides are directories: recurse
//! - a directory was deleted on one side and changed on the other: recurse
//!   against an empty tree so the conflicts land on individual files
//! - a blob was deleted on one side and changed on the other: modify/delete
//! - one side has a directory, the other a file: type conflict
//! - both sides changed a blob: line-level merge; added on both sides with
//!   different content: add/add
//!
//! Subtrees and merged blobs are written only when they are free of
//! conflicts; the merge commit is written only when the whole tree is.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, info, trace};

use grove_dag::CommitGraph;
use grove_diff::{is_binary, join_path};
use grove_store::{Blob, Commit, EntryMode, ObjectStore, Signature, Tree, TreeEntry};
use grove_types::ObjectId;

use crate::conflict::{Conflict, ConflictKind};
use crate::error::{MergeError, MergeResult};
use crate::merge3::{merge_lines, LineMerge, MergeOptions};

/// Where a merge is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergePhase {
    Start,
    ComputingBase,
    DiffingTrees,
    Resolving,
    Clean,
    Conflicted,
    NewCommit,
}

impl MergePhase {
    /// Returns `true` if `next` directly follows `self`.
    pub fn can_advance_to(self, next: MergePhase) -> bool {
        use MergePhase::*;
        matches!(
            (self, next),
            (Start, ComputingBase)
                | (ComputingBase, DiffingTrees)
                | (DiffingTrees, Resolving)
                | (Resolving, Clean)
                | (Resolving, Conflicted)
                | (Clean, NewCommit)
        )
    }

    /// Returns `true` for the phases a merge ends in.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Conflicted | Self::NewCommit)
    }
}

impl fmt::Display for MergePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::ComputingBase => "computing-base",
            Self::DiffingTrees => "diffing-trees",
            Self::Resolving => "resolving",
            Self::Clean => "clean",
            Self::Conflicted => "conflicted",
            Self::NewCommit => "new-commit",
        };
        f.write_str(name)
    }
}

/// Result of merging two commits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The merge commit (parents `[ours, theirs]`) and its tree.
    Clean {
        commit: ObjectId,
        tree: ObjectId,
        base: ObjectId,
    },
    /// Every path that needs a human, ordered by path. No commit was made.
    Conflicted {
        base: ObjectId,
        conflicts: Vec<Conflict>,
    },
}

impl MergeOutcome {
    /// Returns `true` if a merge commit was created.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean { .. })
    }

    /// The merge commit, if any.
    pub fn commit(&self) -> Option<ObjectId> {
        match self {
            Self::Clean { commit, .. } => Some(*commit),
            Self::Conflicted { .. } => None,
        }
    }

    /// The merge base both sides were compared against.
    pub fn base(&self) -> ObjectId {
        match self {
            Self::Clean { base, .. } | Self::Conflicted { base, .. } => *base,
        }
    }

    /// The conflicts; empty for a clean merge.
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            Self::Clean { .. } => &[],
            Self::Conflicted { conflicts, .. } => conflicts,
        }
    }
}

/// Result of merging three trees without creating a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeMergeOutcome {
    /// The stored merged tree.
    Clean(ObjectId),
    Conflicted(Vec<Conflict>),
}

/// Merges commits and trees held in an object store.
pub struct MergeEngine<'s> {
    store: &'s dyn ObjectStore,
    options: MergeOptions,
}

impl<'s> MergeEngine<'s> {
    /// Engine with default labels and marker size.
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self::with_options(store, MergeOptions::default())
    }

    pub fn with_options(store: &'s dyn ObjectStore, options: MergeOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge `theirs` into `ours`.
    ///
    /// On a clean merge a commit with parents `[ours, theirs]` is written,
    /// even when one side already contains the other. Histories without a
    /// common ancestor fail with [`MergeError::NoCommonAncestor`] before any
    /// tree is read.
    pub fn merge(
        &self,
        ours: &ObjectId,
        theirs: &ObjectId,
        author: Signature,
        message: impl Into<String>,
    ) -> MergeResult<MergeOutcome> {
        let mut phase = MergePhase::Start;

        advance(&mut phase, MergePhase::ComputingBase);
        let base = CommitGraph::new(self.store)
            .merge_base(ours, theirs)?
            .ok_or(MergeError::NoCommonAncestor {
                ours: *ours,
                theirs: *theirs,
            })?;
        debug!(
            ours = %ours.short_hex(),
            theirs = %theirs.short_hex(),
            base = %base.short_hex(),
            "found merge base"
        );

        advance(&mut phase, MergePhase::DiffingTrees);
        let base_tree = self.store.get_commit(&base)?.tree;
        let ours_tree = self.store.get_commit(ours)?.tree;
        let theirs_tree = self.store.get_commit(theirs)?.tree;

        advance(&mut phase, MergePhase::Resolving);
        match self.merge_trees(&base_tree, &ours_tree, &theirs_tree)? {
            TreeMergeOutcome::Clean(tree) => {
                advance(&mut phase, MergePhase::Clean);
                advance(&mut phase, MergePhase::NewCommit);
                let commit = Commit::new(tree, vec![*ours, *theirs], author, message);
                let commit = self.store.put(&commit.into())?;
                info!(commit = %commit.short_hex(), tree = %tree.short_hex(), "merge committed");
                Ok(MergeOutcome::Clean { commit, tree, base })
            }
            TreeMergeOutcome::Conflicted(conflicts) => {
                advance(&mut phase, MergePhase::Conflicted);
                info!(conflicts = conflicts.len(), "merge has conflicts");
                Ok(MergeOutcome::Conflicted { base, conflicts })
            }
        }
    }

    /// Three-way merge of trees, storing the result when it is clean.
    pub fn merge_trees(
        &self,
        base: &ObjectId,
        ours: &ObjectId,
        theirs: &ObjectId,
    ) -> MergeResult<TreeMergeOutcome> {
        if ours == theirs || theirs == base {
            self.store.get_tree(ours)?;
            return Ok(TreeMergeOutcome::Clean(*ours));
        }
        if ours == base {
            self.store.get_tree(theirs)?;
            return Ok(TreeMergeOutcome::Clean(*theirs));
        }

        let base = self.store.get_tree(base)?;
        let ours = self.store.get_tree(ours)?;
        let theirs = self.store.get_tree(theirs)?;

        let mut conflicts = Vec::new();
        let merged = self.merge_level("", &base, &ours, &theirs, &mut conflicts)?;
        if !conflicts.is_empty() {
            return Ok(TreeMergeOutcome::Conflicted(conflicts));
        }
        Ok(TreeMergeOutcome::Clean(self.store.put(&merged.into())?))
    }

    fn merge_level(
        &self,
        prefix: &str,
        base: &Tree,
        ours: &Tree,
        theirs: &Tree,
        conflicts: &mut Vec<Conflict>,
    ) -> MergeResult<Tree> {
        let names: BTreeSet<&str> = base
            .entries
            .iter()
            .chain(&ours.entries)
            .chain(&theirs.entries)
            .map(|e| e.name.as_str())
            .collect();

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let path = join_path(prefix, name);
            let merged = self.merge_entry(
                &path,
                name,
                base.get(name),
                ours.get(name),
                theirs.get(name),
                conflicts,
            )?;
            entries.extend(merged);
        }
        Ok(Tree::new(entries))
    }

    fn merge_entry(
        &self,
        path: &str,
        name: &str,
        base: Option<&TreeEntry>,
        ours: Option<&TreeEntry>,
        theirs: Option<&TreeEntry>,
        conflicts: &mut Vec<Conflict>,
    ) -> MergeResult<Option<TreeEntry>> {
        if same(ours, theirs) || same(theirs, base) {
            return Ok(ours.cloned());
        }
        if same(ours, base) {
            trace!(path, "taking theirs");
            return Ok(theirs.cloned());
        }

        match (ours, theirs) {
            (Some(o), Some(t)) if o.is_tree() && t.is_tree() => {
                let base_tree = self.tree_or_empty(base)?;
                let ours_tree = self.store.get_tree(&o.object_id)?;
                let theirs_tree = self.store.get_tree(&t.object_id)?;
                self.merge_subtree(path, name, &base_tree, &ours_tree, &theirs_tree, conflicts)
            }
            (Some(o), Some(t)) if o.is_tree() || t.is_tree() => {
                conflicts.push(Conflict::new(
                    path,
                    ConflictKind::Type,
                    base,
                    ours,
                    theirs,
                    format!("{} in ours, {} in theirs", describe(o), describe(t)),
                ));
                Ok(None)
            }
            (Some(o), Some(t)) => self.merge_blobs(path, base, o, t, conflicts),
            (Some(kept), None) | (None, Some(kept)) => {
                let (deleted_in, kept_in) = if ours.is_none() {
                    ("ours", "theirs")
                } else {
                    ("theirs", "ours")
                };
                if kept.is_tree() && base.is_some_and(TreeEntry::is_tree) {
                    let base_tree = self.tree_or_empty(base)?;
                    let kept_tree = self.store.get_tree(&kept.object_id)?;
                    let (ours_tree, theirs_tree) = if ours.is_none() {
                        (Tree::empty(), kept_tree)
                    } else {
                        (kept_tree, Tree::empty())
                    };
                    return self.merge_subtree(
                        path,
                        name,
                        &base_tree,
                        &ours_tree,
                        &theirs_tree,
                        conflicts,
                    );
                }
                if base.is_some_and(|b| b.is_tree() != kept.is_tree()) {
                    conflicts.push(Conflict::new(
                        path,
                        ConflictKind::Type,
                        base,
                        ours,
                        theirs,
                        format!(
                            "deleted in {deleted_in}, replaced by a {} in {kept_in}",
                            describe(kept)
                        ),
                    ));
                    return Ok(None);
                }
                conflicts.push(Conflict::new(
                    path,
                    ConflictKind::ModifyDelete,
                    base,
                    ours,
                    theirs,
                    format!("deleted in {deleted_in} and modified in {kept_in}"),
                ));
                Ok(None)
            }
            (None, None) => Ok(None),
        }
    }

    /// Merge one directory level below `path`, storing it if clean.
    ///
    /// Directories left empty by the merge are dropped.
    fn merge_subtree(
        &self,
        path: &str,
        name: &str,
        base: &Tree,
        ours: &Tree,
        theirs: &Tree,
        conflicts: &mut Vec<Conflict>,
    ) -> MergeResult<Option<TreeEntry>> {
        let before = conflicts.len();
        let merged = self.merge_level(path, base, ours, theirs, conflicts)?;
        if conflicts.len() > before || merged.is_empty() {
            return Ok(None);
        }
        let id = self.store.put(&merged.into())?;
        Ok(Some(TreeEntry::dir(name, id)))
    }

    fn merge_blobs(
        &self,
        path: &str,
        base: Option<&TreeEntry>,
        ours: &TreeEntry,
        theirs: &TreeEntry,
        conflicts: &mut Vec<Conflict>,
    ) -> MergeResult<Option<TreeEntry>> {
        let base_blob = base.filter(|b| !b.is_tree());
        let kind = if base_blob.is_some() {
            ConflictKind::Content
        } else {
            ConflictKind::AddAdd
        };
        let mode = merge_mode(base_blob.map(|b| b.mode), ours.mode, theirs.mode);
        let mode_note = match mode {
            Some(_) => String::new(),
            None => format!("; mode {} in ours, {} in theirs", ours.mode, theirs.mode),
        };
        let conflict = |detail: String| {
            Conflict::new(path, kind, base, Some(ours), Some(theirs), detail + &mode_note)
        };

        if ours.object_id == theirs.object_id {
            return match mode {
                Some(mode) => Ok(Some(TreeEntry::new(mode, &ours.name, ours.object_id))),
                None => {
                    conflicts.push(conflict("both sides changed the file mode".into()));
                    Ok(None)
                }
            };
        }

        let ours_data = self.store.get_blob(&ours.object_id)?.data;
        let theirs_data = self.store.get_blob(&theirs.object_id)?.data;
        let base_data = match base_blob {
            Some(b) => self.store.get_blob(&b.object_id)?.data,
            None => Vec::new(),
        };

        let symlink = ours.mode == EntryMode::Symlink || theirs.mode == EntryMode::Symlink;
        if symlink || is_binary(&base_data) || is_binary(&ours_data) || is_binary(&theirs_data) {
            let what = if symlink { "symlink target" } else { "binary content" };
            let detail = match kind {
                ConflictKind::AddAdd => format!("added on both sides with different {what}"),
                _ => format!("{what} changed on both sides"),
            };
            conflicts.push(conflict(detail));
            return Ok(None);
        }

        match merge_lines(&base_data, &ours_data, &theirs_data, &self.options) {
            LineMerge::Clean(merged) if kind == ConflictKind::Content => match mode {
                Some(mode) => {
                    let id = self.store.put(&Blob::new(merged).into())?;
                    trace!(path, blob = %id.short_hex(), "line merge clean");
                    Ok(Some(TreeEntry::new(mode, &ours.name, id)))
                }
                None => {
                    conflicts.push(conflict("content merged cleanly".into()));
                    Ok(None)
                }
            },
            LineMerge::Clean(_) => {
                conflicts.push(conflict("added on both sides with different content".into()));
                Ok(None)
            }
            LineMerge::Conflicted {
                content,
                conflicts: regions,
            } => {
                let detail = match kind {
                    ConflictKind::AddAdd => "added on both sides with different content".into(),
                    _ => format!("{regions} conflicting region(s)"),
                };
                conflicts.push(conflict(detail).with_marked_content(content));
                Ok(None)
            }
        }
    }

    fn tree_or_empty(&self, entry: Option<&TreeEntry>) -> MergeResult<Tree> {
        match entry {
            Some(e) if e.is_tree() => Ok(self.store.get_tree(&e.object_id)?),
            _ => Ok(Tree::empty()),
        }
    }
}

fn advance(phase: &mut MergePhase, next: MergePhase) {
    debug_assert!(
        phase.can_advance_to(next),
        "invalid merge transition {phase} -> {next}"
    );
    debug!(from = %phase, to = %next, "merge phase");
    *phase = next;
}

fn same(a: Option<&TreeEntry>, b: Option<&TreeEntry>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.mode == b.mode && a.object_id == b.object_id,
        _ => false,
    }
}

fn merge_mode(base: Option<EntryMode>, ours: EntryMode, theirs: EntryMode) -> Option<EntryMode> {
    if ours == theirs || base == Some(theirs) {
        Some(ours)
    } else if base == Some(ours) {
        Some(theirs)
    } else {
        None
    }
}

fn describe(entry: &TreeEntry) -> &'static str {
    if entry.is_tree() {
        "directory"
    } else {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use grove_store::InMemoryObjectStore;

    fn sig(timestamp: i64) -> Signature {
        Signature::new("Tester", "tester@example.com", timestamp, 0)
    }

    /// Build a tree from `(path, content)` pairs, creating subdirectories.
    fn write_tree(store: &dyn ObjectStore, files: &[(&str, &str)]) -> ObjectId {
        let mut entries = Vec::new();
        let mut dirs: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
        for &(path, content) in files {
            match path.split_once('/') {
                Some((dir, rest)) => dirs.entry(dir).or_default().push((rest, content)),
                None => {
                    let id = store.put(&Blob::new(content.as_bytes()).into()).unwrap();
                    entries.push(TreeEntry::file(path, id));
                }
            }
        }
        for (dir, children) in dirs {
            entries.push(TreeEntry::dir(dir, write_tree(store, &children)));
        }
        store.put(&Tree::new(entries).into()).unwrap()
    }

    fn commit(store: &dyn ObjectStore, tree: ObjectId, parents: &[ObjectId], ts: i64) -> ObjectId {
        let commit = Commit::new(tree, parents.to_vec(), sig(ts), format!("commit {ts}"));
        store.put(&commit.into()).unwrap()
    }

    /// base -> ours, base -> theirs; returns (ours, theirs).
    fn fork(
        store: &dyn ObjectStore,
        base: &[(&str, &str)],
        ours: &[(&str, &str)],
        theirs: &[(&str, &str)],
    ) -> (ObjectId, ObjectId) {
        let root = commit(store, write_tree(store, base), &[], 1);
        let ours = commit(store, write_tree(store, ours), &[root], 2);
        let theirs = commit(store, write_tree(store, theirs), &[root], 3);
        (ours, theirs)
    }

    fn read_file(store: &dyn ObjectStore, tree: &ObjectId, path: &str) -> Option<String> {
        let mut tree = store.get_tree(tree).unwrap();
        let mut parts = path.split('/').peekable();
        while let Some(part) = parts.next() {
            let entry = tree.get(part)?.clone();
            if parts.peek().is_none() {
                let blob = store.get_blob(&entry.object_id).unwrap();
                return Some(String::from_utf8(blob.data).unwrap());
            }
            tree = store.get_tree(&entry.object_id).unwrap();
        }
        None
    }

    fn merge(store: &dyn ObjectStore, ours: &ObjectId, theirs: &ObjectId) -> MergeOutcome {
        MergeEngine::new(store)
            .merge(ours, theirs, sig(10), "merge")
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Clean merges
    // -----------------------------------------------------------------------

    #[test]
    fn disjoint_file_changes_merge_cleanly() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("a.txt", "a\n"), ("b.txt", "b\n")],
            &[("a.txt", "A\n"), ("b.txt", "b\n")],
            &[("a.txt", "a\n"), ("b.txt", "B\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let MergeOutcome::Clean { commit, tree, .. } = outcome else {
            panic!("expected clean merge, got {outcome:?}");
        };
        assert_eq!(read_file(&store, &tree, "a.txt").as_deref(), Some("A\n"));
        assert_eq!(read_file(&store, &tree, "b.txt").as_deref(), Some("B\n"));

        let merge_commit = store.get_commit(&commit).unwrap();
        assert_eq!(merge_commit.parents, vec![ours, theirs]);
        assert_eq!(merge_commit.tree, tree);
        assert_eq!(merge_commit.message, "merge");
    }

    #[test]
    fn disjoint_line_changes_in_one_file_merge_cleanly() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("src/lib.rs", "1\n2\n3\n4\n5\n")],
            &[("src/lib.rs", "one\n2\n3\n4\n5\n")],
            &[("src/lib.rs", "1\n2\n3\n4\nfive\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let MergeOutcome::Clean { tree, .. } = outcome else {
            panic!("expected clean merge, got {outcome:?}");
        };
        assert_eq!(
            read_file(&store, &tree, "src/lib.rs").as_deref(),
            Some("one\n2\n3\n4\nfive\n")
        );
    }

    #[test]
    fn identical_additions_and_deletions_agree() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("gone.txt", "x\n"), ("keep.txt", "k\n")],
            &[("keep.txt", "k\n"), ("new.txt", "same\n")],
            &[("keep.txt", "k\n"), ("new.txt", "same\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let MergeOutcome::Clean { tree, .. } = outcome else {
            panic!("expected clean merge, got {outcome:?}");
        };
        assert_eq!(read_file(&store, &tree, "gone.txt"), None);
        assert_eq!(read_file(&store, &tree, "new.txt").as_deref(), Some("same\n"));
    }

    #[test]
    fn emptied_directory_is_dropped() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("dir/a", "a\n"), ("dir/b", "b\n"), ("top", "t\n")],
            &[("dir/b", "b\n"), ("top", "t\n")],
            &[("dir/a", "a\n"), ("top", "t\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let MergeOutcome::Clean { tree, .. } = outcome else {
            panic!("expected clean merge, got {outcome:?}");
        };
        let root = store.get_tree(&tree).unwrap();
        assert!(root.get("dir").is_none());
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn mode_change_and_content_change_combine() {
        let store = InMemoryObjectStore::new();
        let base_blob = store.put(&Blob::new(b"echo hi\n".to_vec()).into()).unwrap();
        let new_blob = store.put(&Blob::new(b"echo bye\n".to_vec()).into()).unwrap();
        let tree = |mode, blob| {
            store
                .put(&Tree::new(vec![TreeEntry::new(mode, "run.sh", blob)]).into())
                .unwrap()
        };
        let root = commit(&store, tree(EntryMode::Regular, base_blob), &[], 1);
        let ours = commit(&store, tree(EntryMode::Executable, base_blob), &[root], 2);
        let theirs = commit(&store, tree(EntryMode::Regular, new_blob), &[root], 3);

        let outcome = merge(&store, &ours, &theirs);
        let MergeOutcome::Clean { tree: merged, .. } = outcome else {
            panic!("expected clean merge, got {outcome:?}");
        };
        let entry = store.get_tree(&merged).unwrap().get("run.sh").cloned().unwrap();
        assert_eq!(entry.mode, EntryMode::Executable);
        assert_eq!(entry.object_id, new_blob);
    }

    #[test]
    fn merging_an_ancestor_still_commits() {
        let store = InMemoryObjectStore::new();
        let tree = write_tree(&store, &[("f", "1\n")]);
        let root = commit(&store, tree, &[], 1);
        let tip_tree = write_tree(&store, &[("f", "2\n")]);
        let tip = commit(&store, tip_tree, &[root], 2);

        let outcome = merge(&store, &tip, &root);
        let MergeOutcome::Clean { commit, tree, base } = outcome else {
            panic!("expected clean merge, got {outcome:?}");
        };
        assert_eq!(base, root);
        assert_eq!(tree, tip_tree);
        assert_eq!(store.get_commit(&commit).unwrap().parents, vec![tip, root]);
    }

    // -----------------------------------------------------------------------
    // Conflicts
    // -----------------------------------------------------------------------

    #[test]
    fn same_line_edit_conflicts_without_commit() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("f.txt", "a\nb\nc\n")],
            &[("f.txt", "a\nours\nc\n")],
            &[("f.txt", "a\ntheirs\nc\n")],
        );
        let objects_before = store.len();

        let outcome = merge(&store, &ours, &theirs);
        assert!(!outcome.is_clean());
        assert_eq!(outcome.commit(), None);
        assert_eq!(store.len(), objects_before);

        let conflicts = outcome.conflicts();
        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.path, "f.txt");
        assert_eq!(conflict.kind, ConflictKind::Content);
        let marked = String::from_utf8(conflict.marked_content.clone().unwrap()).unwrap();
        assert_eq!(
            marked,
            "a\n<<<<<<< ours\nours\n||||||| base\nb\n=======\ntheirs\n>>>>>>> theirs\nc\n"
        );
    }

    #[test]
    fn modify_delete_is_reported() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("f", "v1\n"), ("other", "o\n")],
            &[("other", "o\n")],
            &[("f", "v2\n"), ("other", "o\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let conflicts = outcome.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].path, "f");
        assert_eq!(conflicts[0].kind, ConflictKind::ModifyDelete);
        assert!(conflicts[0].ours.is_none());
        assert!(conflicts[0].theirs.is_some());
        assert_eq!(conflicts[0].detail, "deleted in ours and modified in theirs");
    }

    #[test]
    fn deleted_directory_reports_modified_files_individually() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("src/lib.rs", "lib\n"), ("src/util.rs", "util\n"), ("README", "r\n")],
            &[("src/lib.rs", "LIB\n"), ("src/util.rs", "util\n"), ("README", "r\n")],
            &[("README", "r\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let conflicts = outcome.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].path, "src/lib.rs");
        assert_eq!(conflicts[0].kind, ConflictKind::ModifyDelete);
        assert_eq!(conflicts[0].detail, "deleted in theirs and modified in ours");
    }

    #[test]
    fn add_add_with_different_content() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("base", "b\n")],
            &[("base", "b\n"), ("new.txt", "left\n")],
            &[("base", "b\n"), ("new.txt", "right\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let conflicts = outcome.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::AddAdd);
        assert!(conflicts[0].base.is_none());
        let marked = String::from_utf8(conflicts[0].marked_content.clone().unwrap()).unwrap();
        assert!(marked.starts_with("<<<<<<< ours\nleft\n"));
        assert!(marked.ends_with("=======\nright\n>>>>>>> theirs\n"));
    }

    #[test]
    fn file_versus_directory_is_type_conflict() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("x", "file\n")],
            &[("x/inner", "now a dir\n")],
            &[("x", "edited file\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let conflicts = outcome.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].path, "x");
        assert_eq!(conflicts[0].kind, ConflictKind::Type);
        assert_eq!(conflicts[0].detail, "directory in ours, file in theirs");
    }

    #[test]
    fn directory_replaced_by_file_against_delete_is_type_conflict() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("d/x", "x\n"), ("keep", "k\n")],
            &[("d", "flat\n"), ("keep", "k\n")],
            &[("keep", "k\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let conflicts = outcome.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].path, "d");
        assert_eq!(conflicts[0].kind, ConflictKind::Type);
        assert!(conflicts[0].base.as_ref().is_some_and(TreeEntry::is_tree));
        assert!(conflicts[0].theirs.is_none());
        assert_eq!(conflicts[0].detail, "deleted in theirs, replaced by a file in ours");
    }

    #[test]
    fn binary_conflict_has_no_markers() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("img", "\0base")],
            &[("img", "\0ours")],
            &[("img", "\0theirs")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let conflicts = outcome.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::Content);
        assert!(conflicts[0].marked_content.is_none());
        assert_eq!(conflicts[0].detail, "binary content changed on both sides");
    }

    #[test]
    fn all_conflicts_reported_in_path_order() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(
            &store,
            &[("b.txt", "b\n"), ("a/x", "x\n"), ("c.txt", "c\n"), ("ok", "1\n")],
            &[("b.txt", "B1\n"), ("a/x", "X1\n"), ("c.txt", "c\n"), ("ok", "2\n")],
            &[("b.txt", "B2\n"), ("a/x", "X2\n"), ("ok", "1\n")],
        );

        let outcome = merge(&store, &ours, &theirs);
        let paths: Vec<&str> = outcome.conflicts().iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["a/x", "b.txt"]);
    }

    #[test]
    fn custom_labels_are_used() {
        let store = InMemoryObjectStore::new();
        let (ours, theirs) = fork(&store, &[("f", "x\n")], &[("f", "y\n")], &[("f", "z\n")]);
        let options = MergeOptions {
            labels: crate::MergeLabels {
                ours: "main".into(),
                base: "ancestor".into(),
                theirs: "topic".into(),
            },
            marker_size: 7,
        };

        let outcome = MergeEngine::with_options(&store, options)
            .merge(&ours, &theirs, sig(10), "merge")
            .unwrap();
        let marked = outcome.conflicts()[0].marked_content.clone().unwrap();
        assert_eq!(
            String::from_utf8(marked).unwrap(),
            "<<<<<<< main\ny\n||||||| ancestor\nx\n=======\nz\n>>>>>>> topic\n"
        );
    }

    // -----------------------------------------------------------------------
    // Fatal errors and phases
    // -----------------------------------------------------------------------

    #[test]
    fn unrelated_histories_fail_with_no_common_ancestor() {
        let store = InMemoryObjectStore::new();
        let left = commit(&store, write_tree(&store, &[("a", "a\n")]), &[], 1);
        let right = commit(&store, write_tree(&store, &[("b", "b\n")]), &[], 2);

        let err = MergeEngine::new(&store)
            .merge(&left, &right, sig(10), "merge")
            .unwrap_err();
        assert!(matches!(
            err,
            MergeError::NoCommonAncestor { ours, theirs } if ours == left && theirs == right
        ));
    }

    #[test]
    fn phase_transitions() {
        use MergePhase::*;
        assert!(Start.can_advance_to(ComputingBase));
        assert!(Resolving.can_advance_to(Clean));
        assert!(Resolving.can_advance_to(Conflicted));
        assert!(Clean.can_advance_to(NewCommit));
        assert!(!Conflicted.can_advance_to(NewCommit));
        assert!(!Start.can_advance_to(Resolving));
        assert!(Conflicted.is_terminal() && NewCommit.is_terminal());
        assert!(!Clean.is_terminal());
        assert_eq!(DiffingTrees.to_string(), "diffing-trees");
    }

    #[test]
    fn merge_trees_without_commits() {
        let store = InMemoryObjectStore::new();
        let base = write_tree(&store, &[("f", "1\n2\n3\n")]);
        let ours = write_tree(&store, &[("f", "0\n1\n2\n3\n")]);
        let theirs = write_tree(&store, &[("f", "1\n2\n3\n4\n")]);

        let engine = MergeEngine::new(&store);
        let TreeMergeOutcome::Clean(tree) = engine.merge_trees(&base, &ours, &theirs).unwrap() else {
            panic!("expected clean tree merge");
        };
        assert_eq!(read_file(&store, &tree, "f").as_deref(), Some("0\n1\n2\n3\n4\n"));
        assert_eq!(
            engine.merge_trees(&base, &base, &theirs).unwrap(),
            TreeMergeOutcome::Clean(theirs)
        );
    }
}
