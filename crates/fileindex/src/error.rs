use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum FilesystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Source is disabled: {0}")]
    SourceDisabled(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Cache error for key {key}: {source}")]
    Cache {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FilesystemError {
    /// Wraps an I/O error raised while touching the on-disk entry for `key`.
    pub fn cache(key: &str, source: std::io::Error) -> Self {
        Self::Cache {
            key: key.to_string(),
            source,
        }
    }

    /// Returns true when the error means the target no longer exists or
    /// cannot be opened, which the indexer treats as a deletion.
    pub fn is_vanished(&self) -> bool {
        match self {
            Self::PathNotFound(_) => true,
            Self::Io(error) => matches!(
                error.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FilesystemError>;

/// Canonicalizes a path, returning the original if canonicalization fails.
pub fn canonicalize_existing_path(path: PathBuf) -> PathBuf {
    std::fs::canonicalize(&path).unwrap_or(path)
}

/// Converts a missing-path I/O error into `PathNotFound` for the given index path.
pub(crate) fn io_error_for(
    index_path: &str,
    real_path: &Path,
    error: std::io::Error,
) -> FilesystemError {
    if error.kind() == std::io::ErrorKind::NotFound {
        log::debug!(
            "filesystem path vanished index_path={} real_path={}",
            index_path,
            real_path.display()
        );
        FilesystemError::PathNotFound(index_path.to_string())
    } else {
        FilesystemError::Io(error)
    }
}
