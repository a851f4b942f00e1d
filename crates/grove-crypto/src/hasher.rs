use grove_types::{ObjectId, DIGEST_LEN};
use sha1::{Digest, Sha1};

/// Type-tagged SHA-1 content hasher.
///
/// Each hasher carries a type tag (`"blob"`, `"tree"`, `"commit"`) that is
/// written, together with the payload length, as a `"<tag> <len>\0"` header
/// in front of the payload before hashing. A blob and a tree with identical
/// payload bytes therefore never share a digest.
pub struct ContentHasher {
    tag: &'static str,
}

impl ContentHasher {
    /// Hasher for blob objects.
    pub const BLOB: Self = Self { tag: "blob" };
    /// Hasher for tree objects.
    pub const TREE: Self = Self { tag: "tree" };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self { tag: "commit" };

    /// The `"<tag> <len>\0"` header for a payload of `len` bytes.
    pub fn header(&self, len: usize) -> Vec<u8> {
        format!("{} {}\0", self.tag, len).into_bytes()
    }

    /// Hash a payload under this hasher's type tag.
    pub fn hash(&self, payload: &[u8]) -> ObjectId {
        let mut hasher = Sha1::new();
        hasher.update(self.header(payload.len()));
        hasher.update(payload);
        finish(hasher)
    }

    /// Raw SHA-1 of already-framed bytes (header included).
    ///
    /// This is `digest_of` for a full canonical encoding: no I/O, no parsing.
    pub fn raw_hash(data: &[u8]) -> ObjectId {
        let mut hasher = Sha1::new();
        hasher.update(data);
        finish(hasher)
    }

    /// The type tag used by this hasher.
    pub fn tag(&self) -> &str {
        self.tag
    }
}

fn finish(hasher: Sha1) -> ObjectId {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&hasher.finalize());
    ObjectId::from_hash(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        let id1 = ContentHasher::BLOB.hash(data);
        let id2 = ContentHasher::BLOB.hash(data);
        assert_eq!(id1, id2);
    }

    #[test]
    fn empty_blob_matches_git() {
        // `git hash-object -t blob /dev/null`
        let id = ContentHasher::BLOB.hash(b"");
        assert_eq!(id.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn hello_blob_matches_git() {
        // `printf 'hello\n' | git hash-object --stdin`
        let id = ContentHasher::BLOB.hash(b"hello\n");
        assert_eq!(id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn different_tags_produce_different_hashes() {
        let data = b"same content";
        let blob_hash = ContentHasher::BLOB.hash(data);
        let tree_hash = ContentHasher::TREE.hash(data);
        let commit_hash = ContentHasher::COMMIT.hash(data);
        assert_ne!(blob_hash, tree_hash);
        assert_ne!(blob_hash, commit_hash);
        assert_ne!(tree_hash, commit_hash);
    }

    #[test]
    fn raw_hash_over_framed_bytes_matches_tagged_hash() {
        let payload = b"framed";
        let mut framed = ContentHasher::BLOB.header(payload.len());
        framed.extend_from_slice(payload);
        assert_eq!(
            ContentHasher::raw_hash(&framed),
            ContentHasher::BLOB.hash(payload)
        );
    }

    #[test]
    fn header_format() {
        assert_eq!(ContentHasher::TREE.header(42), b"tree 42\0".to_vec());
    }

    #[test]
    fn tags_match_object_kinds() {
        assert_eq!(ContentHasher::BLOB.tag(), "blob");
        assert_eq!(ContentHasher::TREE.tag(), "tree");
        assert_eq!(ContentHasher::COMMIT.tag(), "commit");
    }
}
