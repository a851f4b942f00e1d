//! Slim commit nodes cached by the commit graph.

use grove_store::Commit;
use grove_types::ObjectId;

/// The part of a commit the graph algorithms need: identity, parent edges
/// and the author timestamp used to order history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitNode {
    /// Digest of the commit.
    pub id: ObjectId,
    /// Parent digests in commit order (first parent first).
    pub parents: Vec<ObjectId>,
    /// Author timestamp, seconds since the Unix epoch.
    pub timestamp: i64,
}

impl CommitNode {
    /// Project a decoded commit onto its graph node.
    pub fn from_commit(id: ObjectId, commit: &Commit) -> Self {
        Self {
            id,
            parents: commit.parents.clone(),
            timestamp: commit.timestamp(),
        }
    }

    /// Returns `true` if this commit has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns `true` if this commit has two or more parents.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// The first parent, if any.
    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_store::Signature;

    #[test]
    fn projects_commit_fields() {
        let p1 = ObjectId::from_hash([1; 20]);
        let p2 = ObjectId::from_hash([2; 20]);
        let commit = Commit::new(
            ObjectId::from_hash([9; 20]),
            vec![p1, p2],
            Signature::new("A", "a@example.com", 1234, 60),
            "merge",
        );
        let node = CommitNode::from_commit(commit.id(), &commit);
        assert_eq!(node.id, commit.id());
        assert_eq!(node.parents, vec![p1, p2]);
        assert_eq!(node.timestamp, 1234);
        assert!(node.is_merge());
        assert!(!node.is_root());
        assert_eq!(node.first_parent(), Some(&p1));
    }
}
