use grove_types::ObjectId;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, Commit, Object, StoredObject, Tree};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same content always produces
///   the same ID, so a second write of the same object is a no-op.
/// - A partially written object is never observable under its final ID.
/// - Concurrent reads are always safe (objects are immutable).
/// - The store is append-only: there is no update or delete.
/// - All I/O errors are propagated as [`StoreError::StoreUnavailable`].
///
/// Backends implement the three raw methods; the typed helpers (`put`,
/// `get`, `get_tree`, ...) are provided on top of them.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Encode, hash and persist an object, returning its digest.
    ///
    /// Values that would not decode back to themselves (unsorted or
    /// duplicate tree entries, reserved characters in a signature) are
    /// rejected with `MalformedObject` before anything is written.
    fn put(&self, object: &Object) -> StoreResult<ObjectId> {
        object.validate()?;
        let id = self.write(&object.to_stored_object())?;
        trace!(id = %id.short_hex(), kind = %object.kind(), "put object");
        Ok(id)
    }

    /// Fetch and decode an object.
    fn get(&self, id: &ObjectId) -> StoreResult<Object> {
        let stored = self
            .read(id)?
            .ok_or(StoreError::ObjectNotFound(*id))?;
        Object::from_stored_object(&stored)
    }

    /// Existence check without a decode.
    fn contains(&self, id: &ObjectId) -> StoreResult<bool> {
        self.exists(id)
    }

    /// Fetch an object that must be a blob.
    fn get_blob(&self, id: &ObjectId) -> StoreResult<Blob> {
        let stored = self.read(id)?.ok_or(StoreError::ObjectNotFound(*id))?;
        Blob::from_stored_object(&stored)
    }

    /// Fetch an object that must be a tree.
    fn get_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        let stored = self.read(id)?.ok_or(StoreError::ObjectNotFound(*id))?;
        Tree::from_stored_object(&stored)
    }

    /// Fetch an object that must be a commit.
    fn get_commit(&self, id: &ObjectId) -> StoreResult<Commit> {
        let stored = self.read(id)?.ok_or(StoreError::ObjectNotFound(*id))?;
        Commit::from_stored_object(&stored)
    }
}
