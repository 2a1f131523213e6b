//! Keyed on-disk storage for derived artifacts such as thumbnails.
//!
//! Each key lives at `<root>/<h[0]>/<h[1..3]>/<h>` where `h` is the hex SHA-1
//! of the key. Writes go to a temp file in the shard directory and are renamed
//! into place, so a reader never sees a partially written value.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use parking_lot::Mutex;
use sha1::{Digest, Sha1};
use tempfile::NamedTempFile;

use crate::config::DiskCacheConfig;
use crate::error::{FilesystemError, Result};

#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
    /// Serializes store and delete per key. Idle locks are evicted.
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl DiskCache {
    pub fn new(config: &DiskCacheConfig) -> Result<Self> {
        fs::create_dir_all(&config.root)?;
        let locks = Cache::builder()
            .max_capacity(config.lock_capacity.max(1))
            .time_to_idle(Duration::from_secs(config.lock_idle_secs.max(1)))
            .build();
        log::info!("filesystem disk cache opened root={}", config.root.display());
        Ok(Self {
            root: config.root.clone(),
            locks,
        })
    }

    /// Opens a cache at `root` with default lock bounds.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::new(&DiskCacheConfig {
            root: root.into(),
            ..DiskCacheConfig::default()
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sharded file location for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let hash = format!("{:x}", Sha1::digest(key.as_bytes()));
        self.root.join(&hash[..1]).join(&hash[1..3]).join(&hash)
    }

    /// Writes `value` under `key`, replacing any previous value.
    pub fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        let lock = self.lock_for(key);
        let _guard = lock.lock();

        let path = self.path_for(key);
        let dir = path
            .parent()
            .ok_or_else(|| FilesystemError::Internal(format!("cache path has no parent: {key}")))?;
        fs::create_dir_all(dir).map_err(|error| FilesystemError::cache(key, error))?;

        let mut temp =
            NamedTempFile::new_in(dir).map_err(|error| FilesystemError::cache(key, error))?;
        temp.write_all(value)
            .map_err(|error| FilesystemError::cache(key, error))?;
        temp.persist(&path)
            .map_err(|error| FilesystemError::cache(key, error.error))?;
        log::debug!("filesystem cache stored key={key} bytes={}", value.len());
        Ok(())
    }

    /// Reads the value under `key`. A missing key is `Ok(None)`.
    pub fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(FilesystemError::cache(key, error)),
        }
    }

    /// Removes the value under `key`. Removing an absent key succeeds.
    pub fn delete(&self, key: &str) -> Result<()> {
        let lock = self.lock_for(key);
        let _guard = lock.lock();

        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(FilesystemError::cache(key, error)),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with(key.to_string(), || Arc::new(Mutex::new(())))
    }
}
