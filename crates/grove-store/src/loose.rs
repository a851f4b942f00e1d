use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use grove_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Default zstd level for loose objects.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// One file per object under `<root>/<2 hex>/<38 hex>`.
///
/// Each file holds the zstd-compressed canonical bytes (header included).
/// Writes land in a temporary file inside the fan-out directory and are
/// renamed into place, so a reader never sees a partial object under its
/// final name. Every read re-hashes the decompressed bytes.
#[derive(Debug, Clone)]
pub struct LooseObjectStore {
    root: PathBuf,
    compression_level: i32,
}

impl LooseObjectStore {
    /// Open (creating if needed) a loose store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_compression(root, DEFAULT_COMPRESSION_LEVEL)
    }

    /// Open with an explicit zstd compression level.
    pub fn with_compression(root: impl Into<PathBuf>, compression_level: i32) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        debug!(root = %root.display(), compression_level, "opened loose object store");
        Ok(Self {
            root,
            compression_level,
        })
    }

    /// Directory holding the fan-out subdirectories.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path an object with `id` is (or would be) stored at.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }
}

impl ObjectStore for LooseObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let compressed = match std::fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let bytes = zstd::decode_all(compressed.as_slice())
            .map_err(|e| StoreError::malformed(format!("object {id}: decompression failed: {e}")))?;
        let object = StoredObject::from_bytes(&bytes)?;

        let actual = object.compute_id();
        if actual != *id {
            warn!(expected = %id.short_hex(), actual = %actual.short_hex(), "loose object hash mismatch");
            return Err(StoreError::malformed(format!(
                "object {id}: content hashes to {actual}"
            )));
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.exists() {
            trace!(id = %id.short_hex(), "object already present");
            return Ok(id);
        }

        let dir = path
            .parent()
            .ok_or_else(|| StoreError::malformed(format!("object {id}: no fan-out directory")))?;
        std::fs::create_dir_all(dir)?;

        let compressed = zstd::encode_all(object.to_bytes().as_slice(), self.compression_level)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&compressed)?;
        tmp.as_file().sync_all()?;

        if let Err(e) = tmp.persist(&path) {
            // Another writer may have published the same content first.
            if !path.exists() {
                return Err(e.error.into());
            }
        }

        trace!(id = %id.short_hex(), kind = %object.kind, size = object.size, "wrote loose object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        match std::fs::metadata(self.object_path(id)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
