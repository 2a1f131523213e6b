//! Per-source index state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::rules::EntryRules;
use crate::config::{Source, SourceConfig};
use crate::path::{join_index_path, ROOT_PATH};
use crate::scheduler::Schedule;
use crate::types::{DirectoryInfo, IndexStats};

/// Running totals for an index.
#[derive(Debug, Default)]
pub struct IndexCounters {
    pub num_dirs: AtomicU64,
    pub num_files: AtomicU64,
    /// Directories removed since the last full pass started.
    pub removed: AtomicU64,
}

/// In-memory model of one source's directory tree.
///
/// `directories` maps normalized index paths to their latest `DirectoryInfo`.
/// Entries are replaced as whole values, so a reader holding an `Arc` always
/// sees a self-consistent directory listing.
#[derive(Debug)]
pub struct Index {
    source: Source,
    rules: EntryRules,
    directories: RwLock<BTreeMap<String, Arc<DirectoryInfo>>>,
    pub(crate) counters: IndexCounters,
    /// Serializes scan invocations for this source.
    pub(crate) scan_lane: Mutex<()>,
    pub(crate) schedule: Mutex<Schedule>,
}

impl Index {
    pub fn new(source: Source) -> Self {
        let rules = EntryRules::from_config(&source.config);
        Self {
            source,
            rules,
            directories: RwLock::new(BTreeMap::new()),
            counters: IndexCounters::default(),
            scan_lane: Mutex::new(()),
            schedule: Mutex::new(Schedule::default()),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn root(&self) -> &Path {
        &self.source.path
    }

    pub fn config(&self) -> &SourceConfig {
        &self.source.config
    }

    pub(crate) fn rules(&self) -> &EntryRules {
        &self.rules
    }

    /// Maps a normalized index path to a path under the source root.
    ///
    /// Does not resolve symlinks; see `real_path` for that.
    pub(crate) fn disk_path(&self, index_path: &str) -> PathBuf {
        let relative = index_path.trim_start_matches('/');
        if relative.is_empty() {
            self.source.path.clone()
        } else {
            self.source.path.join(relative)
        }
    }

    pub fn get_directory(&self, path: &str) -> Option<Arc<DirectoryInfo>> {
        self.directories.read().get(path).cloned()
    }

    pub fn contains_directory(&self, path: &str) -> bool {
        self.directories.read().contains_key(path)
    }

    /// Number of indexed directories.
    pub fn len(&self) -> usize {
        self.directories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.read().is_empty()
    }

    /// Snapshot of all directory paths in lexicographic order.
    pub fn directory_paths(&self) -> Vec<String> {
        self.directories.read().keys().cloned().collect()
    }

    /// Snapshot of the directories at or below `scope`, in path order.
    ///
    /// Only `Arc` handles are cloned while the read lock is held.
    pub fn snapshot_scope(&self, scope: &str) -> Vec<Arc<DirectoryInfo>> {
        let directories = self.directories.read();
        if scope == ROOT_PATH {
            return directories.values().cloned().collect();
        }
        let prefix = format!("{scope}/");
        let mut snapshot = Vec::new();
        if let Some(info) = directories.get(scope) {
            snapshot.push(info.clone());
        }
        snapshot.extend(
            directories
                .range(prefix.clone()..)
                .take_while(|(path, _)| path.starts_with(prefix.as_str()))
                .map(|(_, info)| info.clone()),
        );
        snapshot
    }

    /// Replaces the entry for `info.path`.
    pub(crate) fn store_directory(&self, info: Arc<DirectoryInfo>) {
        self.directories.write().insert(info.path.clone(), info);
    }

    /// Applies `update` to the entry at `path` and stores the result.
    ///
    /// Returns false when the path is not indexed.
    pub(crate) fn update_directory(
        &self,
        path: &str,
        update: impl FnOnce(&DirectoryInfo) -> DirectoryInfo,
    ) -> bool {
        let mut directories = self.directories.write();
        let Some(existing) = directories.get(path) else {
            return false;
        };
        let updated = Arc::new(update(existing));
        directories.insert(path.to_string(), updated);
        true
    }

    /// Removes `path` and every directory below it.
    ///
    /// Returns the number of removed entries.
    pub(crate) fn remove_subtree(&self, path: &str) -> u64 {
        let mut directories = self.directories.write();
        if path == ROOT_PATH {
            let removed = directories.len() as u64;
            directories.clear();
            self.counters.removed.fetch_add(removed, Ordering::Relaxed);
            return removed;
        }
        let mut doomed = Vec::new();
        if directories.contains_key(path) {
            doomed.push(path.to_string());
        }
        let prefix = format!("{path}/");
        doomed.extend(
            directories
                .range(prefix.clone()..)
                .take_while(|(candidate, _)| candidate.starts_with(prefix.as_str()))
                .map(|(candidate, _)| candidate.clone()),
        );
        for candidate in &doomed {
            directories.remove(candidate);
        }
        let removed = doomed.len() as u64;
        if removed > 0 {
            self.counters.removed.fetch_add(removed, Ordering::Relaxed);
        }
        removed
    }

    /// Removes the subtree rooted at `parent/name`.
    pub(crate) fn remove_child_subtree(&self, parent: &str, name: &str) -> u64 {
        self.remove_subtree(&join_index_path(parent, name))
    }

    pub fn stats(&self) -> IndexStats {
        let schedule = self.schedule.lock();
        IndexStats {
            source: self.source.name.clone(),
            num_dirs: self.counters.num_dirs.load(Ordering::Relaxed),
            num_files: self.counters.num_files.load(Ordering::Relaxed),
            removed: self.counters.removed.load(Ordering::Relaxed),
            complexity: schedule.complexity(),
            schedule_tier: schedule.tier(),
            smart_modifier_secs: schedule.smart_modifier().as_secs(),
            last_scan_ms: schedule.last_scan_ms(),
            last_full_scan_ms: schedule.last_full_scan_ms(),
            last_full_scan_at: schedule.last_full_scan_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_type::FileKind;
    use crate::types::ItemInfo;
    use std::time::UNIX_EPOCH;
    use tempfile::TempDir;

    fn directory(path: &str, size: u64) -> Arc<DirectoryInfo> {
        Arc::new(DirectoryInfo {
            path: path.to_string(),
            name: crate::path::base_name(path).to_string(),
            size,
            modified: UNIX_EPOCH,
            hidden: false,
            files: vec![ItemInfo {
                name: "a.txt".to_string(),
                size,
                modified: UNIX_EPOCH,
                kind: FileKind::Text,
                hidden: false,
            }],
            folders: Vec::new(),
        })
    }

    fn test_index(temp: &TempDir) -> Index {
        Index::new(Source::new("test", temp.path(), SourceConfig::default()).unwrap())
    }

    #[test]
    fn remove_subtree_keeps_similar_prefixes() {
        let temp = TempDir::new().unwrap();
        let index = test_index(&temp);
        for path in ["/", "/a", "/a/b", "/a/b/c", "/a!x", "/ab"] {
            index.store_directory(directory(path, 1));
        }

        assert_eq!(index.remove_subtree("/a"), 3);
        assert_eq!(index.directory_paths(), vec!["/", "/a!x", "/ab"]);
        assert_eq!(index.counters.removed.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn snapshot_scope_is_limited_to_subtree() {
        let temp = TempDir::new().unwrap();
        let index = test_index(&temp);
        for path in ["/", "/docs", "/docs/sub", "/docsx", "/media"] {
            index.store_directory(directory(path, 1));
        }

        let paths: Vec<_> = index
            .snapshot_scope("/docs")
            .iter()
            .map(|info| info.path.clone())
            .collect();
        assert_eq!(paths, vec!["/docs", "/docs/sub"]);
        assert_eq!(index.snapshot_scope("/").len(), 5);
    }

    #[test]
    fn update_directory_replaces_value() {
        let temp = TempDir::new().unwrap();
        let index = test_index(&temp);
        index.store_directory(directory("/docs", 1));
        let before = index.get_directory("/docs").unwrap();

        assert!(index.update_directory("/docs", |info| DirectoryInfo {
            size: 42,
            ..info.clone()
        }));
        assert!(!index.update_directory("/missing", |info| info.clone()));

        assert_eq!(before.size, 1);
        assert_eq!(index.get_directory("/docs").unwrap().size, 42);
    }

    #[test]
    fn disk_path_joins_relative_segments() {
        let temp = TempDir::new().unwrap();
        let index = test_index(&temp);
        assert_eq!(index.disk_path("/"), index.root());
        assert_eq!(index.disk_path("/docs/a"), index.root().join("docs/a"));
    }
}
