//! Metadata lookups served from the index.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::data::Index;
use crate::error::{io_error_for, FilesystemError, Result};
use crate::path::{base_name, normalize_index_path, parent_index_path, ROOT_PATH};
use crate::types::{DirectoryInfo, ItemInfo};

/// An index path resolved to a location on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealPath {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl Index {
    /// Returns the indexed directory for `path`, or the directory containing
    /// `path` when it names a file.
    pub fn get_metadata_info(&self, path: &str, is_dir: bool) -> Option<Arc<DirectoryInfo>> {
        let path = normalize_index_path(path);
        if is_dir {
            return self.get_directory(&path);
        }
        let parent = parent_index_path(&path)?;
        self.get_directory(parent)
    }

    /// Returns the single-item view of `path`.
    pub fn get_reduced_metadata(&self, path: &str, is_dir: bool) -> Option<ItemInfo> {
        let path = normalize_index_path(path);
        if is_dir {
            return self.get_directory(&path).map(|info| info.as_item());
        }
        let parent = self.get_directory(parent_index_path(&path)?)?;
        parent.file(base_name(&path)).cloned()
    }

    /// Resolves an index path to an absolute path on disk, following symlinks.
    ///
    /// Paths that resolve outside the source root are rejected.
    pub fn real_path(&self, path: &str) -> Result<RealPath> {
        let path = normalize_index_path(path);
        let joined = self.disk_path(&path);
        let resolved =
            fs::canonicalize(&joined).map_err(|error| io_error_for(&path, &joined, error))?;
        if path != ROOT_PATH && !resolved.starts_with(self.root()) {
            return Err(FilesystemError::InvalidInput(format!(
                "path {path} resolves outside source {}",
                self.name()
            )));
        }
        let is_dir = fs::metadata(&resolved)
            .map_err(|error| io_error_for(&path, &resolved, error))?
            .is_dir();
        Ok(RealPath {
            path: resolved,
            is_dir,
        })
    }
}
