use grove_types::ObjectId;

/// Errors from object store and codec operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A digest is referenced but no object with that digest was ever stored.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Stored or supplied bytes fail canonical decode (corruption or foreign data).
    #[error("malformed object: {0}")]
    MalformedObject(String),

    /// The underlying storage medium failed a read or write.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] std::io::Error),
}

impl StoreError {
    /// Shorthand for a [`StoreError::MalformedObject`] with the given reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedObject(reason.into())
    }

    /// `true` when the caller may retry the operation unchanged.
    ///
    /// Only storage-medium failures qualify; the store itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
