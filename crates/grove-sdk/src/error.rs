use std::path::PathBuf;

use grove_dag::DagError;
use grove_diff::DiffError;
use grove_merge::MergeError;
use grove_store::StoreError;
use grove_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroveError {
    #[error("repository already exists at {}", .0.display())]
    RepositoryExists(PathBuf),

    #[error("not a grove repository (or any parent directory): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("unsupported repository format version {0}")]
    UnsupportedFormat(u32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("commit graph error: {0}")]
    Dag(#[from] DagError),

    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),
}

impl GroveError {
    /// The digest that was referenced but absent, wherever it surfaced.
    pub fn missing_object(&self) -> Option<ObjectId> {
        let store = match self {
            Self::Store(e) | Self::Diff(DiffError::Store(e)) | Self::Merge(MergeError::Store(e)) => e,
            Self::Dag(e) | Self::Merge(MergeError::Dag(e)) => return e.missing_object(),
            _ => return None,
        };
        match store {
            StoreError::ObjectNotFound(id) => Some(*id),
            _ => None,
        }
    }

    /// `true` for storage-medium failures the caller may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Store(e) | Self::Diff(DiffError::Store(e)) | Self::Merge(MergeError::Store(e)) => {
                e.is_retryable()
            }
            Self::Dag(DagError::Store(e)) | Self::Merge(MergeError::Dag(DagError::Store(e))) => {
                e.is_retryable()
            }
            _ => false,
        }
    }
}

pub type GroveResult<T> = Result<T, GroveError>;
