//! Content-addressed object storage for grove.
//!
//! This crate implements a hash-keyed object store analogous to git's
//! `.git/objects/` directory. Every blob, tree and commit is stored as an
//! immutable object identified by the SHA-1 of its canonical encoding.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content (file contents, arbitrary data)
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`Commit`] -- tree snapshot with ordered parents, author and message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`LooseObjectStore`] -- one zstd-compressed file per object
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. The store is append-only: no update, no delete.
//! 3. A partial write is never observable under the final digest.
//! 4. Concurrent reads are always safe (objects are immutable).
//! 5. All I/O errors are propagated as `StoreUnavailable`, never retried.

pub mod codec;
pub mod error;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use codec::{decode, digest_of, encode};
pub use error::{StoreError, StoreResult};
pub use loose::LooseObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{
    Blob, Commit, EntryMode, Object, ObjectKind, Signature, StoredObject, Tree, TreeEntry,
};
pub use traits::ObjectStore;
