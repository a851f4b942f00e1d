//! Content hashing for grove.
//!
//! Provides the type-tagged SHA-1 hasher that turns an object's canonical
//! encoding into its [`ObjectId`](grove_types::ObjectId).
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
