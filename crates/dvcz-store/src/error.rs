use std::io;
use std::path::{Path, PathBuf};

use dvcz_types::TypeError;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Bad store name, digest shape, or enumerated label.
    #[error(transparent)]
    Validation(#[from] TypeError),

    /// The requested object is not in the store.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The store root directory does not exist.
    #[error("content-keyed store not found at {}", .0.display())]
    RootNotFound(PathBuf),

    /// The store root exists but is not a directory.
    #[error("store root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The process may not create or write below the store root.
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// A serialized store descriptor could not be parsed.
    #[error("invalid store descriptor: {0}")]
    Format(String),

    /// The layout marker exists but cannot be decoded.
    #[error("corrupt layout marker {}: {reason}", .path.display())]
    CorruptMarker { path: PathBuf, reason: String },

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Wrap an I/O error raised while touching `path`, keeping permission
    /// failures distinguishable.
    pub(crate) fn io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied(path.to_path_buf())
        } else {
            Self::Io(err)
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
