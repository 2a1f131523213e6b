//! Source configuration.
//!
//! These types are deserialized by the host (from YAML or JSON) and handed to
//! the index once at startup. Reloading requires building a new index.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{canonicalize_existing_path, FilesystemError, Result};

/// A configured filesystem root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub config: SourceConfig,
}

impl Source {
    /// Creates a source, resolving `path` to an absolute existing directory.
    pub fn new(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        config: SourceConfig,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FilesystemError::InvalidInput(
                "source name must not be empty".to_string(),
            ));
        }
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|error| {
            FilesystemError::InvalidInput(format!(
                "unable to access source root {}: {error}",
                path.display()
            ))
        })?;
        if !metadata.is_dir() {
            return Err(FilesystemError::InvalidInput(format!(
                "source root is not a directory: {}",
                path.display()
            )));
        }
        Ok(Self {
            name,
            path: canonicalize_existing_path(path.to_path_buf()),
            config,
        })
    }

    /// Re-validates a deserialized source the same way `Source::new` does.
    pub fn resolve(self) -> Result<Self> {
        Self::new(self.name, self.path, self.config)
    }
}

/// How file sizes are accounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBasis {
    /// Apparent size (`len`).
    #[default]
    Logical,
    /// Allocated size on disk.
    Physical,
}

/// Rules applied while walking a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceConfig {
    pub disabled: bool,
    pub ignore_hidden: bool,
    pub ignore_zero_size_folders: bool,
    pub size_basis: SizeBasis,
    pub include: IncludeRules,
    pub exclude: ExcludeRules,
}

/// When any list is non-empty, only matching entries are indexed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncludeRules {
    pub file_paths: Vec<String>,
    pub folder_paths: Vec<String>,
}

impl IncludeRules {
    pub fn is_empty(&self) -> bool {
        self.file_paths.is_empty() && self.folder_paths.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExcludeRules {
    pub file_paths: Vec<String>,
    pub folder_paths: Vec<String>,
    pub file_names: Vec<String>,
    pub folder_names: Vec<String>,
    pub file_ends_with: Vec<String>,
    pub folder_ends_with: Vec<String>,
}

/// Location and lock bounds for the on-disk artifact cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiskCacheConfig {
    pub root: PathBuf,
    /// Maximum number of idle per-key locks kept alive.
    pub lock_capacity: u64,
    /// Seconds an unused per-key lock survives before eviction.
    pub lock_idle_secs: u64,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("fileindex-cache"),
            lock_capacity: 10_000,
            lock_idle_secs: 10 * 60,
        }
    }
}
