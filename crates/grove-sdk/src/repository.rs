use std::fs;
use std::path::{Path, PathBuf};

use grove_dag::CommitGraph;
use grove_diff::{diff_blobs, diff_trees, join_path, BlobDiff, TreeDiff};
use grove_merge::{MergeEngine, MergeOutcome};
use grove_store::{
    Blob, Commit, InMemoryObjectStore, LooseObjectStore, Object, ObjectKind, ObjectStore,
    Signature, Tree, TreeEntry,
};
use grove_types::ObjectId;
use tracing::{debug, info};

use crate::config::{GroveConfig, CONFIG_FILE};
use crate::error::{GroveError, GroveResult};
use crate::log::Log;

/// Name of the repository directory under the working root.
pub const GROVE_DIR: &str = ".grove";

const OBJECTS_DIR: &str = "objects";

/// High-level grove repository API.
///
/// Branch names and the staging area live outside this type: callers pass
/// commit and tree digests in and get digests back.
pub struct Grove {
    root: Option<PathBuf>,
    config: GroveConfig,
    store: Box<dyn ObjectStore>,
}

impl Grove {
    /// Create a repository under `root` with the default configuration.
    pub fn init(root: impl AsRef<Path>) -> GroveResult<Self> {
        Self::init_with_config(root, GroveConfig::default())
    }

    pub fn init_with_config(root: impl AsRef<Path>, config: GroveConfig) -> GroveResult<Self> {
        config.validate()?;
        let root = root.as_ref();
        let grove_dir = root.join(GROVE_DIR);
        if grove_dir.exists() {
            return Err(GroveError::RepositoryExists(root.to_path_buf()));
        }

        fs::create_dir_all(&grove_dir)?;
        config.save(&grove_dir.join(CONFIG_FILE))?;
        let root = root.canonicalize()?;
        let store = LooseObjectStore::with_compression(
            root.join(GROVE_DIR).join(OBJECTS_DIR),
            config.core.compression_level,
        )?;

        info!(root = %root.display(), "initialized repository");
        Ok(Self {
            root: Some(root),
            config,
            store: Box::new(store),
        })
    }

    /// Open the repository containing `start`, searching parent directories.
    pub fn open(start: impl AsRef<Path>) -> GroveResult<Self> {
        let root = find_root(start.as_ref())?;
        let grove_dir = root.join(GROVE_DIR);
        let config = GroveConfig::load(&grove_dir.join(CONFIG_FILE))?;
        config.validate()?;
        let store =
            LooseObjectStore::with_compression(grove_dir.join(OBJECTS_DIR), config.core.compression_level)?;

        debug!(root = %root.display(), "opened repository");
        Ok(Self {
            root: Some(root),
            config,
            store: Box::new(store),
        })
    }

    /// A repository with no on-disk presence.
    pub fn in_memory() -> Self {
        Self {
            root: None,
            config: GroveConfig::default(),
            store: Box::new(InMemoryObjectStore::new()),
        }
    }

    /// Use a caller-provided backend.
    pub fn with_store(store: Box<dyn ObjectStore>, config: GroveConfig) -> GroveResult<Self> {
        config.validate()?;
        Ok(Self {
            root: None,
            config,
            store,
        })
    }

    // ---- Content operations ----

    pub fn write_blob(&self, data: impl Into<Vec<u8>>) -> GroveResult<ObjectId> {
        Ok(self.store.put(&Blob::new(data).into())?)
    }

    pub fn get_blob(&self, id: &ObjectId) -> GroveResult<Vec<u8>> {
        Ok(self.store.get_blob(id)?.data)
    }

    /// Store a tree. Every entry must name an existing object of the kind
    /// its mode implies.
    pub fn write_tree(&self, entries: Vec<TreeEntry>) -> GroveResult<ObjectId> {
        for entry in &entries {
            self.expect_kind(&entry.object_id, entry.kind())?;
        }
        Ok(self.store.put(&Tree::new(entries).into())?)
    }

    pub fn get_tree(&self, id: &ObjectId) -> GroveResult<Tree> {
        Ok(self.store.get_tree(id)?)
    }

    /// Every blob reachable from `tree`, with its slash-separated path, in
    /// path order.
    pub fn list_files(&self, tree: &ObjectId) -> GroveResult<Vec<(String, TreeEntry)>> {
        let mut files = Vec::new();
        let mut stack = vec![(String::new(), self.store.get_tree(tree)?)];
        while let Some((prefix, tree)) = stack.pop() {
            for entry in tree.entries {
                let path = join_path(&prefix, &entry.name);
                if entry.is_tree() {
                    stack.push((path, self.store.get_tree(&entry.object_id)?));
                } else {
                    files.push((path, entry));
                }
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    /// Fetch any object by digest.
    pub fn get_object(&self, id: &ObjectId) -> GroveResult<Object> {
        Ok(self.store.get(id)?)
    }

    // ---- Commit operations ----

    /// Record a snapshot. The tree and every parent must already be stored.
    pub fn create_commit(
        &self,
        tree: &ObjectId,
        parents: &[ObjectId],
        author: Signature,
        message: impl Into<String>,
    ) -> GroveResult<ObjectId> {
        self.expect_kind(tree, ObjectKind::Tree)?;
        for parent in parents {
            self.expect_kind(parent, ObjectKind::Commit)?;
        }

        let commit = Commit::new(*tree, parents.to_vec(), author, message);
        let id = self.store.put(&commit.into())?;
        info!(
            commit = %id.short_hex(),
            tree = %tree.short_hex(),
            parents = parents.len(),
            "created commit"
        );
        Ok(id)
    }

    pub fn get_commit(&self, id: &ObjectId) -> GroveResult<Commit> {
        Ok(self.store.get_commit(id)?)
    }

    /// History of `start`, newest first.
    pub fn log(&self, start: &ObjectId) -> GroveResult<Log<'_>> {
        let history = CommitGraph::new(self.store()).into_history(start)?;
        Ok(Log::new(history, self.store()))
    }

    // ---- Ancestry ----

    /// Is `candidate` reachable from `of` (or equal to it)?
    pub fn is_ancestor(&self, candidate: &ObjectId, of: &ObjectId) -> GroveResult<bool> {
        Ok(CommitGraph::new(self.store()).is_ancestor(candidate, of)?)
    }

    pub fn merge_base(&self, a: &ObjectId, b: &ObjectId) -> GroveResult<Option<ObjectId>> {
        Ok(CommitGraph::new(self.store()).merge_base(a, b)?)
    }

    /// All lowest common ancestors.
    pub fn merge_bases(&self, a: &ObjectId, b: &ObjectId) -> GroveResult<Vec<ObjectId>> {
        Ok(CommitGraph::new(self.store()).merge_bases(a, b)?)
    }

    /// `start` and every ancestor, breadth-first.
    pub fn ancestors(&self, start: &ObjectId) -> GroveResult<Vec<ObjectId>> {
        let graph = CommitGraph::new(self.store());
        let ancestors = graph.ancestors_of(start).collect::<Result<Vec<_>, _>>()?;
        Ok(ancestors)
    }

    // ---- Diff and merge ----

    /// Path-level changes from `old` (or nothing) to `new`.
    pub fn diff(&self, old: Option<&ObjectId>, new: &ObjectId) -> GroveResult<TreeDiff> {
        Ok(diff_trees(self.store(), old, new)?)
    }

    pub fn diff_blobs(&self, old: &ObjectId, new: &ObjectId) -> GroveResult<BlobDiff> {
        let old = self.store.get_blob(old)?;
        let new = self.store.get_blob(new)?;
        Ok(diff_blobs(&old.data, &new.data))
    }

    /// Merge `theirs` into `ours` using the configured labels and marker size.
    pub fn merge(
        &self,
        ours: &ObjectId,
        theirs: &ObjectId,
        author: Signature,
        message: impl Into<String>,
    ) -> GroveResult<MergeOutcome> {
        let engine = MergeEngine::with_options(self.store(), self.config.merge_options());
        Ok(engine.merge(ours, theirs, author, message)?)
    }

    // ---- Accessors ----

    /// Working root; `None` for in-memory repositories.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn config(&self) -> &GroveConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    fn expect_kind(&self, id: &ObjectId, kind: ObjectKind) -> GroveResult<()> {
        match kind {
            ObjectKind::Blob => drop(self.store.get_blob(id)?),
            ObjectKind::Tree => drop(self.store.get_tree(id)?),
            ObjectKind::Commit => drop(self.store.get_commit(id)?),
        }
        Ok(())
    }
}

impl std::fmt::Debug for Grove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grove")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn find_root(start: &Path) -> GroveResult<PathBuf> {
    let start = start.canonicalize()?;
    let mut dir = Some(start.as_path());
    while let Some(candidate) = dir {
        if candidate.join(GROVE_DIR).is_dir() {
            return Ok(candidate.to_path_buf());
        }
        dir = candidate.parent();
    }
    Err(GroveError::NotARepository(start))
}
