//! Ancestry queries over commits stored in an [`ObjectStore`].
//!
//! [`CommitGraph`] never holds the whole history in memory: it loads commits
//! on demand through the store and caches their [`CommitNode`] projection.
//! Every traversal uses an explicit frontier and a visited set, so deep
//! histories cannot grow the stack and diamond-shaped histories visit each
//! commit once.
//!
//! # Merge base
//!
//! [`CommitGraph::merge_bases`] expands both tips in synchronized
//! breadth-first rounds, marking each commit with the sides that reached it.
//! A commit marked by both sides is a common-ancestor candidate; everything
//! below it is marked stale and no longer produces candidates. The walk ends
//! once the frontier holds only stale commits. Candidates that are ancestors
//! of another candidate are then discarded, leaving the lowest common
//! ancestors in the order they were discovered.

use std::cell::RefCell;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use bitflags::bitflags;
use tracing::{debug, trace};

use grove_store::ObjectStore;
use grove_types::ObjectId;

use crate::error::DagResult;
use crate::node::CommitNode;

bitflags! {
    /// Which tips reached a commit during a merge-base walk.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct Reach: u8 {
        const FROM_A = 0b0001;
        const FROM_B = 0b0010;
        const BOTH = Self::FROM_A.bits() | Self::FROM_B.bits();
        /// Below an already-found common ancestor.
        const STALE = 0b0100;
        /// Recorded as a merge-base candidate.
        const RESULT = 0b1000;
    }
}

/// Read-only view of the commit DAG stored in an object store.
pub struct CommitGraph<'s> {
    store: &'s dyn ObjectStore,
    cache: RefCell<HashMap<ObjectId, CommitNode>>,
}

impl<'s> CommitGraph<'s> {
    /// Create a graph view over `store`.
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self {
            store,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Load the graph node for a commit.
    pub fn node(&self, id: &ObjectId) -> DagResult<CommitNode> {
        if let Some(node) = self.cache.borrow().get(id) {
            return Ok(node.clone());
        }
        let commit = self.store.get_commit(id)?;
        let node = CommitNode::from_commit(*id, &commit);
        self.cache.borrow_mut().insert(*id, node.clone());
        Ok(node)
    }

    /// Every commit reachable from `start` by parent edges, `start` included.
    ///
    /// Breadth-first, each digest yielded once. The first error ends the
    /// sequence.
    pub fn ancestors_of(&self, start: &ObjectId) -> Ancestors<'_, 's> {
        let mut visited = HashSet::new();
        visited.insert(*start);
        Ancestors {
            graph: self,
            frontier: VecDeque::from([*start]),
            visited,
            done: false,
        }
    }

    /// Returns `true` if `candidate` is `of` or one of its ancestors.
    pub fn is_ancestor(&self, candidate: &ObjectId, of: &ObjectId) -> DagResult<bool> {
        if candidate == of {
            self.node(of)?;
            return Ok(true);
        }
        for id in self.ancestors_of(of) {
            if id? == *candidate {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A lowest common ancestor of `a` and `b`, or `None` for unrelated
    /// histories.
    ///
    /// When several lowest common ancestors exist, the one discovered first
    /// by the synchronized walk is returned.
    pub fn merge_base(&self, a: &ObjectId, b: &ObjectId) -> DagResult<Option<ObjectId>> {
        Ok(self.merge_bases(a, b)?.into_iter().next())
    }

    /// All lowest common ancestors of `a` and `b`, in discovery order.
    pub fn merge_bases(&self, a: &ObjectId, b: &ObjectId) -> DagResult<Vec<ObjectId>> {
        if a == b {
            self.node(a)?;
            return Ok(vec![*a]);
        }

        let candidates = self.common_candidates(a, b)?;
        let mut bases = Vec::with_capacity(candidates.len());
        for (i, candidate) in candidates.iter().enumerate() {
            let mut redundant = false;
            for (j, other) in candidates.iter().enumerate() {
                if i != j && self.is_ancestor(candidate, other)? {
                    redundant = true;
                    break;
                }
            }
            if redundant {
                trace!(commit = %candidate.short_hex(), "dropping redundant merge-base candidate");
            } else {
                bases.push(*candidate);
            }
        }

        debug!(
            a = %a.short_hex(),
            b = %b.short_hex(),
            candidates = candidates.len(),
            bases = bases.len(),
            "computed merge bases"
        );
        Ok(bases)
    }

    fn common_candidates(&self, a: &ObjectId, b: &ObjectId) -> DagResult<Vec<ObjectId>> {
        let mut marks: HashMap<ObjectId, Reach> = HashMap::new();
        marks.insert(*a, Reach::FROM_A);
        marks.insert(*b, Reach::FROM_B);

        let mark_of = |marks: &HashMap<ObjectId, Reach>, id: &ObjectId| {
            marks.get(id).copied().unwrap_or_default()
        };

        let mut round = vec![*a, *b];
        let mut candidates = Vec::new();
        let mut depth = 0usize;

        while round
            .iter()
            .any(|id| !mark_of(&marks, id).contains(Reach::STALE))
        {
            let mut next = Vec::new();
            for id in round {
                let mut flags = mark_of(&marks, &id);
                if flags.contains(Reach::BOTH) && !flags.intersects(Reach::STALE | Reach::RESULT) {
                    flags |= Reach::RESULT;
                    marks.insert(id, flags);
                    candidates.push(id);
                    trace!(commit = %id.short_hex(), depth, "merge-base candidate");
                }

                let mut inherited = flags & (Reach::BOTH | Reach::STALE);
                if flags.contains(Reach::BOTH) {
                    inherited |= Reach::STALE;
                }

                for parent in self.node(&id)?.parents {
                    let entry = marks.entry(parent).or_default();
                    if entry.contains(inherited) {
                        continue;
                    }
                    *entry |= inherited;
                    next.push(parent);
                }
            }
            round = next;
            depth += 1;
        }

        Ok(candidates)
    }

    /// Consume the graph into a newest-first walk of the history of `start`.
    ///
    /// Commits are ordered by author timestamp, newest first, with ties broken
    /// by digest. All parents are followed and each commit is yielded once.
    pub fn into_history(self, start: &ObjectId) -> DagResult<History<'s>> {
        let node = self.node(start)?;
        let mut queue = BinaryHeap::new();
        queue.push((node.timestamp, node.id));
        let mut seen = HashSet::new();
        seen.insert(node.id);
        Ok(History {
            graph: self,
            queue,
            seen,
            pending: Vec::new(),
            done: false,
        })
    }
}

impl std::fmt::Debug for CommitGraph<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitGraph")
            .field("cached_nodes", &self.cache.borrow().len())
            .finish()
    }
}

/// Lazy breadth-first walk over a commit and its ancestors.
///
/// Created by [`CommitGraph::ancestors_of`].
pub struct Ancestors<'g, 's> {
    graph: &'g CommitGraph<'s>,
    frontier: VecDeque<ObjectId>,
    visited: HashSet<ObjectId>,
    done: bool,
}

impl Iterator for Ancestors<'_, '_> {
    type Item = DagResult<ObjectId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let id = self.frontier.pop_front()?;
        match self.graph.node(&id) {
            Ok(node) => {
                for parent in node.parents {
                    if self.visited.insert(parent) {
                        self.frontier.push_back(parent);
                    }
                }
                Some(Ok(id))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Newest-first history walk. Created by [`CommitGraph::into_history`].
pub struct History<'s> {
    graph: CommitGraph<'s>,
    queue: BinaryHeap<(i64, ObjectId)>,
    seen: HashSet<ObjectId>,
    /// Parents of the last yielded commit, loaded on the next step.
    pending: Vec<ObjectId>,
    done: bool,
}

impl History<'_> {
    fn advance(&mut self) -> DagResult<Option<CommitNode>> {
        for parent in std::mem::take(&mut self.pending) {
            let parent_node = self.graph.node(&parent)?;
            self.queue.push((parent_node.timestamp, parent_node.id));
        }
        let Some((_, id)) = self.queue.pop() else {
            return Ok(None);
        };
        let node = self.graph.node(&id)?;
        self.pending = node
            .parents
            .iter()
            .copied()
            .filter(|parent| self.seen.insert(*parent))
            .collect();
        Ok(Some(node))
    }
}

impl Iterator for History<'_> {
    type Item = DagResult<CommitNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
