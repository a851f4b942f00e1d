//! Foundation types for grove.
//!
//! Every other grove crate depends on `grove-types`. The crate is deliberately
//! small: it holds the identifier type shared by the object store, the commit
//! graph and the merge engine.
//!
//! # Key Types
//!
//! - [`ObjectId`]: content-addressed identifier (160-bit SHA-1 digest)

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::{ObjectId, DIGEST_LEN};
