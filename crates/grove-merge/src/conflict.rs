//! Merge conflict records.
//!
//! Conflicts are data, not errors: a merge collects every conflicting path
//! in one pass and hands the full list back to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};

use grove_store::TreeEntry;

/// Why a path could not be merged automatically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Both sides changed the same file differently.
    Content,
    /// One side deleted the entry, the other modified it.
    ModifyDelete,
    /// Both sides added the path with different content.
    AddAdd,
    /// One side has a file where the other has a directory, or one side
    /// changed the entry's kind and the other deleted it.
    Type,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Content => "content",
            Self::ModifyDelete => "modify/delete",
            Self::AddAdd => "add/add",
            Self::Type => "type",
        })
    }
}

/// A single unresolved path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Slash-separated path from the root of the tree.
    pub path: String,
    pub kind: ConflictKind,
    /// The entry at `path` in the merge base, if any.
    pub base: Option<TreeEntry>,
    /// The entry at `path` on our side, if any.
    pub ours: Option<TreeEntry>,
    /// The entry at `path` on their side, if any.
    pub theirs: Option<TreeEntry>,
    /// Human-readable description of the disagreement.
    pub detail: String,
    /// File content with conflict markers, for text conflicts.
    ///
    /// Never written to the object store.
    pub marked_content: Option<Vec<u8>>,
}

impl Conflict {
    pub(crate) fn new(
        path: impl Into<String>,
        kind: ConflictKind,
        base: Option<&TreeEntry>,
        ours: Option<&TreeEntry>,
        theirs: Option<&TreeEntry>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            base: base.cloned(),
            ours: ours.cloned(),
            theirs: theirs.cloned(),
            detail: detail.into(),
            marked_content: None,
        }
    }

    pub(crate) fn with_marked_content(mut self, content: Vec<u8>) -> Self {
        self.marked_content = Some(content);
        self
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CONFLICT ({}): {}: {}", self.kind, self.path, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_types::ObjectId;

    #[test]
    fn display_names_kind_and_path() {
        let entry = TreeEntry::file("f", ObjectId::from_hash([1; 20]));
        let conflict = Conflict::new(
            "dir/f",
            ConflictKind::ModifyDelete,
            Some(&entry),
            Some(&entry),
            None,
            "deleted in theirs and modified in ours",
        );
        assert_eq!(
            conflict.to_string(),
            "CONFLICT (modify/delete): dir/f: deleted in theirs and modified in ours"
        );
        assert!(conflict.marked_content.is_none());
    }

    #[test]
    fn serializes_for_reports() {
        let conflict = Conflict::new("a", ConflictKind::AddAdd, None, None, None, "added twice")
            .with_marked_content(b"<<<<<<<".to_vec());
        let json = serde_json::to_value(&conflict).unwrap();
        assert_eq!(json["kind"], "AddAdd");
        assert_eq!(json["path"], "a");
    }
}
