use serde::{Deserialize, Serialize};
use grove_crypto::ContentHasher;
use grove_types::ObjectId;

use crate::codec;
use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing: sorted entries mapping names to object references.
    Tree,
    /// Snapshot pointer with parent links, author and message.
    Commit,
}

impl ObjectKind {
    /// The type tag written in the object header.
    pub fn tag(&self) -> &'static str {
        self.hasher().tag()
    }

    /// Parse a header type tag.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"blob" => Some(Self::Blob),
            b"tree" => Some(Self::Tree),
            b"commit" => Some(Self::Commit),
            _ => None,
        }
    }

    fn hasher(&self) -> &'static ContentHasher {
        match self {
            Self::Blob => &ContentHasher::BLOB,
            Self::Tree => &ContentHasher::TREE,
            Self::Commit => &ContentHasher::COMMIT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A stored object: kind tag + payload bytes + cached size.
///
/// `StoredObject` is the unit of storage. Backends never interpret the
/// payload; they persist the canonical framing produced by [`to_bytes`].
///
/// [`to_bytes`]: StoredObject::to_bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload bytes (everything after the header).
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and payload.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    /// Canonical framing: `"<kind> <len>\0"` followed by the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.kind.hasher().header(self.data.len());
        out.extend_from_slice(&self.data);
        out
    }

    /// Parse canonical framing, checking the type tag and declared length.
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        let nul = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| StoreError::malformed("missing header terminator"))?;
        let header = &bytes[..nul];
        let payload = &bytes[nul + 1..];

        let space = header
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| StoreError::malformed("header has no length field"))?;
        let kind = ObjectKind::from_tag(&header[..space]).ok_or_else(|| {
            StoreError::malformed(format!(
                "unknown object type {:?}",
                String::from_utf8_lossy(&header[..space])
            ))
        })?;

        let declared = parse_decimal(&header[space + 1..])
            .ok_or_else(|| StoreError::malformed("header length is not a decimal number"))?;
        if declared != payload.len() {
            return Err(StoreError::malformed(format!(
                "declared length {declared} does not match payload length {}",
                payload.len()
            )));
        }

        Ok(Self::new(kind, payload.to_vec()))
    }
}

fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty()
        || !digits.iter().all(u8::is_ascii_digit)
        || (digits.len() > 1 && digits[0] == b'0')
    {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object (analogous to git blob).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        expect_kind(obj, ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }

    /// The blob's object ID.
    pub fn id(&self) -> ObjectId {
        ContentHasher::BLOB.hash(&self.data)
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree / directory (0o040000).
    Directory,
}

impl EntryMode {
    /// Octal mode value (for display/serialization).
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
        }
    }

    /// Parse from an octal mode value.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o040000 => Some(Self::Directory),
            _ => None,
        }
    }

    /// The kind of object an entry with this mode points at.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::Directory => ObjectKind::Tree,
            _ => ObjectKind::Blob,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// A single entry in a tree object: `(mode, name, digest, kind)`.
///
/// The kind is carried by the mode: directories point at trees, every other
/// mode points at a blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeEntry {
    /// File mode (regular, executable, symlink, directory).
    pub mode: EntryMode,
    /// Entry name (a single path component).
    pub name: String,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    /// Shorthand for a regular-file entry.
    pub fn file(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self::new(EntryMode::Regular, name, object_id)
    }

    /// Shorthand for a subdirectory entry.
    pub fn dir(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self::new(EntryMode::Directory, name, object_id)
    }

    /// Kind of the referenced object.
    pub fn kind(&self) -> ObjectKind {
        self.mode.object_kind()
    }

    /// Returns `true` if this entry is a subtree.
    pub fn is_tree(&self) -> bool {
        self.kind() == ObjectKind::Tree
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.object_id.cmp(&other.object_id))
            .then_with(|| self.mode.mode_bits().cmp(&other.mode.mode_bits()))
    }
}

/// Returns an error if `name` cannot appear as a single tree entry name.
pub fn validate_entry_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(StoreError::malformed("empty tree entry name"));
    }
    if name == "." || name == ".." {
        return Err(StoreError::malformed(format!(
            "reserved tree entry name {name:?}"
        )));
    }
    if name.contains('/') || name.contains('\0') {
        return Err(StoreError::malformed(format!(
            "tree entry name {name:?} contains a separator or NUL"
        )));
    }
    Ok(())
}

/// Directory listing object (analogous to git tree).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted by name.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries.
    ///
    /// Entries are sorted by name so insertion order never affects the digest.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Tree, codec::encode_tree(self))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        expect_kind(obj, ObjectKind::Tree)?;
        codec::decode_tree(&obj.data)
    }

    /// The tree's object ID.
    pub fn id(&self) -> ObjectId {
        self.to_stored_object().compute_id()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check entry names and reject duplicates.
    pub fn validate(&self) -> StoreResult<()> {
        for entry in &self.entries {
            validate_entry_name(&entry.name)?;
        }
        for pair in self.entries.windows(2) {
            if pair[0].name >= pair[1].name {
                return Err(StoreError::malformed(format!(
                    "tree entries not strictly sorted at {:?}",
                    pair[1].name
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Author identity plus the moment of authorship.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Offset from UTC in minutes (e.g. `-300` for `-0500`).
    pub tz_offset_minutes: i32,
}

impl Signature {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: i64,
        tz_offset_minutes: i32,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp,
            tz_offset_minutes,
        }
    }

    /// The timestamp as a zoned date-time, if representable.
    pub fn when(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        let offset = chrono::FixedOffset::east_opt(self.tz_offset_minutes * 60)?;
        chrono::DateTime::from_timestamp(self.timestamp, 0).map(|utc| utc.with_timezone(&offset))
    }

    /// `"Name <email>"`.
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    fn validate(&self) -> StoreResult<()> {
        let bad = |s: &str| s.contains(|c: char| matches!(c, '<' | '>' | '\n' | '\0'));
        if bad(&self.name) || bad(&self.email) {
            return Err(StoreError::malformed(format!(
                "signature {:?} contains reserved characters",
                self.display_name()
            )));
        }
        if self.tz_offset_minutes.abs() >= 100 * 60 {
            return Err(StoreError::malformed(format!(
                "timezone offset {} out of range",
                self.tz_offset_minutes
            )));
        }
        Ok(())
    }
}

/// Commit object: a tree snapshot, its ordered parents, author and message.
///
/// Parent order is significant: the first parent is the branch that was
/// checked out when the commit was made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub message: String,
}

impl Commit {
    pub fn new(
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            parents,
            author,
            message: message.into(),
        }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Commit, codec::encode_commit(self))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        expect_kind(obj, ObjectKind::Commit)?;
        codec::decode_commit(&obj.data)
    }

    /// The commit's object ID.
    pub fn id(&self) -> ObjectId {
        self.to_stored_object().compute_id()
    }

    /// Seconds since the epoch at which the commit was authored.
    pub fn timestamp(&self) -> i64 {
        self.author.timestamp
    }

    /// Returns `true` for a commit without parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns `true` for a commit with two or more parents.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// Any storable object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
        }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        match self {
            Self::Blob(blob) => blob.to_stored_object(),
            Self::Tree(tree) => tree.to_stored_object(),
            Self::Commit(commit) => commit.to_stored_object(),
        }
    }

    /// Decode from a `StoredObject` of any kind.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        match obj.kind {
            ObjectKind::Blob => Blob::from_stored_object(obj).map(Self::Blob),
            ObjectKind::Tree => Tree::from_stored_object(obj).map(Self::Tree),
            ObjectKind::Commit => Commit::from_stored_object(obj).map(Self::Commit),
        }
    }

    /// The object's content-addressed ID.
    pub fn id(&self) -> ObjectId {
        self.to_stored_object().compute_id()
    }

    /// Reject values whose encoding would not decode back to themselves.
    pub fn validate(&self) -> StoreResult<()> {
        match self {
            Self::Blob(_) => Ok(()),
            Self::Tree(tree) => tree.validate(),
            Self::Commit(commit) => commit.author.validate(),
        }
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Self::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Self::Commit(commit)
    }
}

fn expect_kind(obj: &StoredObject, expected: ObjectKind) -> StoreResult<()> {
    if obj.kind != expected {
        return Err(StoreError::malformed(format!(
            "object {}: expected {expected}, got {}",
            obj.compute_id(),
            obj.kind
        )));
    }
    Ok(())
}
