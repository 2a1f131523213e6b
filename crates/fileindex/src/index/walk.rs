//! Directory walking that keeps `Index::directories` in sync with disk.
//!
//! The walk is a post-order traversal: every call returns an owned
//! `DirectoryInfo` and stores it only once all of its subdirectories have been
//! resolved, so a parent's aggregate size is always computed from children
//! that are already in the index. Sibling subtrees are walked in parallel with
//! rayon; map writes are serialized by the index write lock.

use std::fs::{self, Metadata};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rayon::prelude::*;

use super::data::Index;
use super::rules::{is_bundle, is_hidden};
use crate::config::SizeBasis;
use crate::error::{io_error_for, FilesystemError, Result};
use crate::file_type::{classify_file_name, FileKind};
use crate::path::{base_name, join_index_path, normalize_index_path, ROOT_PATH};
use crate::types::{duration_ms, DirectoryInfo, ItemInfo};

/// Outcome of one `index_directory` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub dirs: u64,
    pub files: u64,
    pub removed: u64,
    pub errors: u64,
    /// True when any directory differed from its cached state.
    pub files_changed: bool,
    pub elapsed: Duration,
}

/// Accumulators shared by all subtrees of a single scan.
#[derive(Debug)]
struct ScanPass {
    quick: bool,
    recursive: bool,
    dirs: AtomicU64,
    files: AtomicU64,
    removed: AtomicU64,
    errors: AtomicU64,
    changed: AtomicBool,
}

impl ScanPass {
    fn new(quick: bool, recursive: bool) -> Self {
        Self {
            quick,
            recursive,
            dirs: AtomicU64::new(0),
            files: AtomicU64::new(0),
            removed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            changed: AtomicBool::new(false),
        }
    }

    fn mark_changed(&self) {
        self.changed.store(true, Ordering::Relaxed);
    }

    fn record_directory(&self, info: &DirectoryInfo) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
        self.files
            .fetch_add(info.files.len() as u64, Ordering::Relaxed);
    }

    fn record_removed(&self, count: u64) {
        if count > 0 {
            self.removed.fetch_add(count, Ordering::Relaxed);
            self.mark_changed();
        }
    }

    fn finish(self, elapsed: Duration) -> ScanReport {
        ScanReport {
            dirs: self.dirs.into_inner(),
            files: self.files.into_inner(),
            removed: self.removed.into_inner(),
            errors: self.errors.into_inner(),
            files_changed: self.changed.into_inner(),
            elapsed,
        }
    }
}

/// A subdirectory discovered by `read_dir` that survived the rules.
struct PendingFolder {
    name: String,
    path: String,
    item: ItemInfo,
}

impl Index {
    /// Indexes the directory at `path` (relative to the source root).
    ///
    /// With `quick`, unchanged directories (same modification time as the
    /// cached entry) are not re-read; only their known subdirectories are
    /// revisited. With `recursive`, subdirectories are walked before their
    /// parent is stored.
    ///
    /// A directory that cannot be opened is removed from the index and its
    /// error is returned.
    pub fn index_directory(&self, path: &str, quick: bool, recursive: bool) -> Result<ScanReport> {
        let path = normalize_index_path(path);
        let _scan_guard = self.scan_lane.lock();
        self.index_directory_locked(&path, quick, recursive)
    }

    pub(crate) fn index_directory_locked(
        &self,
        path: &str,
        quick: bool,
        recursive: bool,
    ) -> Result<ScanReport> {
        let started = Instant::now();
        let full_pass = path == ROOT_PATH && recursive;
        if full_pass {
            self.counters.removed.store(0, Ordering::Relaxed);
        }

        let pass = ScanPass::new(quick, recursive);
        if !self.path_admitted(path) {
            self.forget_directory(&pass, path);
            log::debug!(
                "filesystem index path rejected by rules source={} path={}",
                self.name(),
                path
            );
            return Ok(pass.finish(started.elapsed()));
        }
        let result = self.walk_directory(&pass, path);
        let report = pass.finish(started.elapsed());
        result?;

        if full_pass {
            self.counters.num_dirs.store(report.dirs, Ordering::Relaxed);
            self.counters.num_files.store(report.files, Ordering::Relaxed);
        }
        log::debug!(
            "filesystem index pass source={} path={} quick={} recursive={} dirs={} files={} removed={} errors={} changed={} elapsed_ms={}",
            self.name(),
            path,
            quick,
            recursive,
            report.dirs,
            report.files,
            report.removed,
            report.errors,
            report.files_changed,
            duration_ms(report.elapsed),
        );
        Ok(report)
    }

    /// Walks one directory and stores its entry.
    ///
    /// Returns `Ok(None)` when the directory was dropped by the zero-size rule.
    fn walk_directory(&self, pass: &ScanPass, path: &str) -> Result<Option<Arc<DirectoryInfo>>> {
        let disk_path = self.disk_path(path);
        let cached = self.get_directory(path);

        let metadata = match fs::metadata(&disk_path) {
            Ok(metadata) if metadata.is_dir() => metadata,
            Ok(_) => {
                self.forget_directory(pass, path);
                return Err(FilesystemError::PathNotFound(path.to_string()));
            }
            Err(error) => {
                self.forget_directory(pass, path);
                return Err(io_error_for(path, &disk_path, error));
            }
        };
        let modified = modified_time(&metadata);

        match cached.as_deref() {
            Some(cached) if cached.modified == modified => {
                if pass.quick && pass.recursive {
                    return self.revisit_unchanged(pass, cached);
                }
            }
            _ => pass.mark_changed(),
        }

        let read_dir = match fs::read_dir(&disk_path) {
            Ok(read_dir) => read_dir,
            Err(error) => {
                self.forget_directory(pass, path);
                return Err(io_error_for(path, &disk_path, error));
            }
        };

        let size_basis = self.config().size_basis;
        let mut files = Vec::new();
        let mut pending_folders = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    pass.errors.fetch_add(1, Ordering::Relaxed);
                    log::debug!("filesystem index skip entry path={path} error={error}");
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(error) => {
                    pass.errors.fetch_add(1, Ordering::Relaxed);
                    log::debug!("filesystem index skip entry path={path} name={name} error={error}");
                    continue;
                }
            };

            let hidden = is_hidden(&name, &entry_metadata);
            let descend = entry_metadata.is_dir() && !is_bundle(&name);
            let child_path = join_index_path(path, &name);
            if !self.rules().admits(&child_path, &name, descend, hidden) {
                continue;
            }

            if descend {
                let known_size = self
                    .get_directory(&child_path)
                    .map(|info| info.size)
                    .unwrap_or(0);
                pending_folders.push(PendingFolder {
                    item: ItemInfo {
                        name: name.clone(),
                        size: known_size,
                        modified: modified_time(&entry_metadata),
                        kind: FileKind::Directory,
                        hidden,
                    },
                    name,
                    path: child_path,
                });
            } else {
                files.push(ItemInfo {
                    size: item_size(&entry_metadata, size_basis),
                    modified: modified_time(&entry_metadata),
                    kind: classify_file_name(&name),
                    hidden,
                    name,
                });
            }
        }

        let folders = if pass.recursive {
            self.walk_children(pass, path, pending_folders)
        } else {
            pending_folders
                .into_iter()
                .map(|pending| pending.item)
                .collect()
        };

        if let Some(cached) = cached.as_deref() {
            self.prune_vanished(pass, cached, &folders);
        }

        let info = DirectoryInfo {
            path: path.to_string(),
            name: base_name(path).to_string(),
            size: 0,
            modified,
            hidden: path != ROOT_PATH && is_hidden(base_name(path), &metadata),
            files,
            folders,
        };
        Ok(self.finish_directory(pass, info))
    }

    /// Quick-scan path for a directory whose modification time is unchanged.
    ///
    /// Files are carried over from the cached entry; known subdirectories are
    /// revisited because changes deep in a tree do not touch ancestor mtimes.
    fn revisit_unchanged(
        &self,
        pass: &ScanPass,
        cached: &DirectoryInfo,
    ) -> Result<Option<Arc<DirectoryInfo>>> {
        let mut pending = Vec::with_capacity(cached.folders.len());
        for item in &cached.folders {
            let path = join_index_path(&cached.path, &item.name);
            if self.rules().admits(&path, &item.name, true, item.hidden) {
                pending.push(PendingFolder {
                    name: item.name.clone(),
                    path,
                    item: item.clone(),
                });
            } else {
                pass.mark_changed();
                self.forget_directory(pass, &path);
            }
        }
        let folders = self.walk_children(pass, &cached.path, pending);

        let info = DirectoryInfo {
            size: 0,
            folders,
            ..cached.clone()
        };
        Ok(self.finish_directory(pass, info))
    }

    /// Walks subdirectories in parallel and returns the surviving folder items,
    /// sized from each child's freshly stored entry.
    fn walk_children(
        &self,
        pass: &ScanPass,
        parent: &str,
        pending: Vec<PendingFolder>,
    ) -> Vec<ItemInfo> {
        pending
            .into_par_iter()
            .filter_map(|folder| match self.walk_directory(pass, &folder.path) {
                Ok(Some(info)) => Some(ItemInfo {
                    size: info.size,
                    modified: info.modified,
                    ..folder.item
                }),
                Ok(None) => None,
                Err(error) => {
                    pass.errors.fetch_add(1, Ordering::Relaxed);
                    log::warn!(
                        "filesystem index subtree dropped source={} parent={} name={} error={}",
                        self.name(),
                        parent,
                        folder.name,
                        error
                    );
                    None
                }
            })
            .collect()
    }

    /// Removes subtrees that were listed in the cached entry but not in the fresh one.
    fn prune_vanished(&self, pass: &ScanPass, cached: &DirectoryInfo, folders: &[ItemInfo]) {
        for previous in &cached.folders {
            if folders.iter().any(|item| item.name == previous.name) {
                continue;
            }
            let removed = self.remove_child_subtree(&cached.path, &previous.name);
            pass.record_removed(removed);
        }
    }

    /// Sorts children, computes the aggregate size and stores the entry.
    fn finish_directory(
        &self,
        pass: &ScanPass,
        mut info: DirectoryInfo,
    ) -> Option<Arc<DirectoryInfo>> {
        info.files.sort_by(|a, b| a.name.cmp(&b.name));
        info.folders.sort_by(|a, b| a.name.cmp(&b.name));
        info.size = info.children_size();

        if info.size == 0 && self.config().ignore_zero_size_folders && info.path != ROOT_PATH {
            self.forget_directory(pass, &info.path);
            return None;
        }

        pass.record_directory(&info);
        let info = Arc::new(info);
        self.store_directory(info.clone());
        Some(info)
    }

    /// Applies the entry rules to every segment of `path`, as a walk from the
    /// root would when descending to it.
    fn path_admitted(&self, path: &str) -> bool {
        let mut current = ROOT_PATH.to_string();
        for name in path.split('/').filter(|segment| !segment.is_empty()) {
            current = join_index_path(&current, name);
            if is_bundle(name) {
                return false;
            }
            let hidden = match fs::symlink_metadata(self.disk_path(&current)) {
                Ok(metadata) => is_hidden(name, &metadata),
                Err(_) => name.starts_with('.'),
            };
            if !self.rules().admits(&current, name, true, hidden) {
                return false;
            }
        }
        true
    }

    fn forget_directory(&self, pass: &ScanPass, path: &str) {
        let removed = self.remove_subtree(path);
        pass.record_removed(removed);
    }
}

/// Size of a file entry under the configured accounting basis.
pub(crate) fn item_size(metadata: &Metadata, basis: SizeBasis) -> u64 {
    match basis {
        SizeBasis::Logical => metadata.len(),
        SizeBasis::Physical => physical_size(metadata),
    }
}

#[cfg(unix)]
fn physical_size(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.blocks() * 512
}

#[cfg(not(unix))]
fn physical_size(metadata: &Metadata) -> u64 {
    metadata.len()
}

pub(crate) fn modified_time(metadata: &Metadata) -> SystemTime {
    metadata.modified().unwrap_or(UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExcludeRules, IncludeRules, Source, SourceConfig};
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_file(path: &Path, size: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(&vec![b'x'; size]).unwrap();
    }

    fn index_for(temp: &TempDir, config: SourceConfig) -> Index {
        Index::new(Source::new("test", temp.path(), config).unwrap())
    }

    fn assert_aggregation(index: &Index) {
        for path in index.directory_paths() {
            let info = index.get_directory(&path).unwrap();
            let files: u64 = info.files.iter().map(|item| item.size).sum();
            let folders: u64 = info
                .folders
                .iter()
                .map(|item| index.get_directory(&join_index_path(&path, &item.name)).unwrap().size)
                .sum();
            assert_eq!(info.size, files + folders, "aggregate mismatch at {path}");
        }
    }

    #[test]
    fn full_scan_aggregates_sizes() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("a.txt"), 10);
        write_file(&temp.path().join("docs/report.pdf"), 100);
        write_file(&temp.path().join("docs/deep/notes.md"), 5);
        fs::create_dir(temp.path().join("empty")).unwrap();

        let index = index_for(&temp, SourceConfig::default());
        let report = index.index_directory("/", false, true).unwrap();

        assert_eq!(report.dirs, 4);
        assert_eq!(report.files, 3);
        assert!(report.files_changed);
        assert_eq!(index.get_directory("/").unwrap().size, 115);
        assert_eq!(index.get_directory("/docs").unwrap().size, 105);
        assert_eq!(index.get_directory("/docs/deep").unwrap().size, 5);
        assert_eq!(index.get_directory("/empty").unwrap().size, 0);
        assert_eq!(index.stats().num_dirs, 4);
        assert_eq!(index.stats().num_files, 3);
        assert_aggregation(&index);

        let docs = index.get_directory("/docs").unwrap();
        assert_eq!(docs.files[0].kind, FileKind::Doc);
        assert_eq!(docs.folders[0].name, "deep");
        assert_eq!(docs.folders[0].size, 5);
    }

    #[test]
    fn repeated_scans_are_idempotent() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("a/b/c.txt"), 3);
        write_file(&temp.path().join("a/d.jpg"), 7);
        write_file(&temp.path().join("e.zip"), 11);

        let index = index_for(&temp, SourceConfig::default());
        index.index_directory("/", false, true).unwrap();
        let first: Vec<_> = index
            .directory_paths()
            .iter()
            .map(|path| index.get_directory(path).unwrap())
            .collect();

        let quick = index.index_directory("/", true, true).unwrap();
        assert!(!quick.files_changed);
        let after_quick: Vec<_> = index
            .directory_paths()
            .iter()
            .map(|path| index.get_directory(path).unwrap())
            .collect();
        assert_eq!(first, after_quick);

        let full = index.index_directory("/", false, true).unwrap();
        assert!(!full.files_changed);
        let after_full: Vec<_> = index
            .directory_paths()
            .iter()
            .map(|path| index.get_directory(path).unwrap())
            .collect();
        assert_eq!(first, after_full);
    }

    #[test]
    fn deleted_directory_is_removed_on_next_scan() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("keep/a.txt"), 1);
        write_file(&temp.path().join("gone/nested/b.txt"), 2);

        let index = index_for(&temp, SourceConfig::default());
        index.index_directory("/", false, true).unwrap();
        assert!(index.contains_directory("/gone/nested"));

        fs::remove_dir_all(temp.path().join("gone")).unwrap();
        let report = index.index_directory("/", false, true).unwrap();

        assert!(report.files_changed);
        assert_eq!(report.removed, 2);
        assert!(!index.contains_directory("/gone"));
        assert!(!index.contains_directory("/gone/nested"));
        assert!(index.get_metadata_info("/gone", true).is_none());
        assert_eq!(index.get_directory("/").unwrap().size, 1);
        assert_eq!(index.stats().removed, 2);
    }

    #[test]
    fn unopenable_directory_is_forgotten_with_error() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("dir/a.txt"), 1);
        let index = index_for(&temp, SourceConfig::default());
        index.index_directory("/", false, true).unwrap();

        fs::remove_dir_all(temp.path().join("dir")).unwrap();
        let error = index.index_directory("/dir", false, true).unwrap_err();

        assert!(error.is_vanished());
        assert!(!index.contains_directory("/dir"));
    }

    #[test]
    fn excluded_suffix_never_indexed() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("keep.txt"), 1);
        write_file(&temp.path().join("scratch.tmp"), 1);
        write_file(&temp.path().join("sub/other.tmp"), 1);
        write_file(&temp.path().join("sub/real.md"), 1);

        let config = SourceConfig {
            exclude: ExcludeRules {
                file_ends_with: vec![".tmp".to_string()],
                ..ExcludeRules::default()
            },
            ..SourceConfig::default()
        };
        let index = index_for(&temp, config);
        index.index_directory("/", false, true).unwrap();

        for path in index.directory_paths() {
            let info = index.get_directory(&path).unwrap();
            assert!(info.files.iter().all(|item| !item.name.ends_with(".tmp")));
        }
        assert_eq!(index.get_directory("/").unwrap().size, 2);
    }

    #[test]
    fn inclusion_rules_limit_walk() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("media/photos/a.jpg"), 4);
        write_file(&temp.path().join("media/music/b.mp3"), 8);
        write_file(&temp.path().join("top.txt"), 1);

        let config = SourceConfig {
            include: IncludeRules {
                folder_paths: vec!["media/photos".to_string()],
                ..IncludeRules::default()
            },
            ..SourceConfig::default()
        };
        let index = index_for(&temp, config);
        index.index_directory("/", false, true).unwrap();

        assert!(index.contains_directory("/media/photos"));
        assert!(!index.contains_directory("/media/music"));
        assert!(index.get_directory("/").unwrap().files.is_empty());
        assert_eq!(index.get_directory("/").unwrap().size, 4);
    }

    #[test]
    fn hidden_and_zero_size_rules() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join(".secret/a.txt"), 3);
        write_file(&temp.path().join(".env"), 3);
        write_file(&temp.path().join("visible/b.txt"), 2);
        fs::create_dir_all(temp.path().join("hollow/inner")).unwrap();

        let config = SourceConfig {
            ignore_hidden: true,
            ignore_zero_size_folders: true,
            ..SourceConfig::default()
        };
        let index = index_for(&temp, config);
        index.index_directory("/", false, true).unwrap();

        let root = index.get_directory("/").unwrap();
        assert!(root.files.is_empty());
        assert_eq!(root.folders.len(), 1);
        assert_eq!(root.folders[0].name, "visible");
        assert!(!index.contains_directory("/hollow"));
        assert!(!index.contains_directory("/hollow/inner"));
        assert!(!index.contains_directory("/.secret"));
    }

    #[test]
    fn hidden_entries_are_flagged_when_kept() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join(".config/x.toml"), 1);
        let index = index_for(&temp, SourceConfig::default());
        index.index_directory("/", false, true).unwrap();

        let root = index.get_directory("/").unwrap();
        assert!(root.folders[0].hidden);
        assert!(index.get_directory("/.config").unwrap().hidden);
        assert!(!root.hidden);
    }

    #[test]
    fn bundles_are_files() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("Tool.app/Contents/binary"), 9);
        let index = index_for(&temp, SourceConfig::default());
        index.index_directory("/", false, true).unwrap();

        let root = index.get_directory("/").unwrap();
        assert!(root.folders.is_empty());
        assert_eq!(root.files.len(), 1);
        assert_eq!(root.files[0].name, "Tool.app");
        assert!(!index.contains_directory("/Tool.app"));
    }

    #[test]
    fn reserved_directories_skipped() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("$RECYCLE.BIN/junk"), 9);
        write_file(&temp.path().join("ok/file"), 1);
        let index = index_for(&temp, SourceConfig::default());
        index.index_directory("/", false, true).unwrap();

        assert!(!index.contains_directory("/$RECYCLE.BIN"));
        assert_eq!(index.get_directory("/").unwrap().size, 1);
    }

    #[test]
    fn non_recursive_uses_known_child_sizes() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("sub/a.bin"), 50);
        let index = index_for(&temp, SourceConfig::default());
        index.index_directory("/", false, true).unwrap();

        write_file(&temp.path().join("b.bin"), 5);
        write_file(&temp.path().join("new/c.bin"), 7);
        index.index_directory("/", false, false).unwrap();

        let root = index.get_directory("/").unwrap();
        assert_eq!(root.size, 55);
        assert_eq!(root.folder("sub").unwrap().size, 50);
        assert_eq!(root.folder("new").unwrap().size, 0);
        assert!(!index.contains_directory("/new"));
    }

    fn excluding_node_modules() -> SourceConfig {
        SourceConfig {
            exclude: ExcludeRules {
                folder_names: vec!["node_modules".to_string()],
                ..ExcludeRules::default()
            },
            ..SourceConfig::default()
        }
    }

    #[test]
    fn indexing_an_excluded_path_forgets_it() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("node_modules/dep/index.js"), 30);
        write_file(&temp.path().join("main.js"), 3);
        let index = index_for(&temp, excluding_node_modules());
        index.index_directory("/", false, true).unwrap();

        let report = index.index_directory("/node_modules/dep", false, true).unwrap();

        assert_eq!(report.dirs, 0);
        assert!(!index.contains_directory("/node_modules/dep"));
        assert!(!index.contains_directory("/node_modules"));
        assert_eq!(index.get_directory("/").unwrap().size, 3);
    }

    #[test]
    fn quick_scan_drops_cached_folders_the_rules_reject() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("node_modules/big.js"), 500);
        write_file(&temp.path().join("main.js"), 3);
        let index = index_for(&temp, excluding_node_modules());
        index.index_directory("/", false, true).unwrap();

        let leaked = ItemInfo {
            name: "node_modules".to_string(),
            size: 500,
            modified: UNIX_EPOCH,
            kind: FileKind::Directory,
            hidden: false,
        };
        index.store_directory(Arc::new(DirectoryInfo {
            path: "/node_modules".to_string(),
            name: "node_modules".to_string(),
            size: 500,
            modified: UNIX_EPOCH,
            hidden: false,
            files: Vec::new(),
            folders: Vec::new(),
        }));
        index.update_directory("/", |info| {
            let mut folders = info.folders.clone();
            folders.push(leaked.clone());
            DirectoryInfo {
                size: info.size + 500,
                folders,
                ..info.clone()
            }
        });

        let report = index.index_directory("/", true, true).unwrap();

        assert!(report.files_changed);
        assert_eq!(report.removed, 1);
        assert!(!index.contains_directory("/node_modules"));
        let root = index.get_directory("/").unwrap();
        assert!(root.folders.is_empty());
        assert_eq!(root.size, 3);
    }

    #[cfg(unix)]
    #[test]
    fn physical_basis_counts_allocated_blocks() {
        use std::os::unix::fs::MetadataExt;

        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("sparse.img"))
            .unwrap()
            .set_len(10 * 1024 * 1024)
            .unwrap();
        write_file(&temp.path().join("data/small.bin"), 10);

        let config = SourceConfig {
            size_basis: SizeBasis::Physical,
            ..SourceConfig::default()
        };
        let index = index_for(&temp, config);
        index.index_directory("/", false, true).unwrap();

        let allocated = |relative: &str| {
            fs::metadata(temp.path().join(relative)).unwrap().blocks() * 512
        };
        let root = index.get_directory("/").unwrap();
        let sparse = root.file("sparse.img").unwrap();
        assert_eq!(sparse.size, allocated("sparse.img"));
        assert!(sparse.size < 10 * 1024 * 1024);
        let small = index.get_directory("/data").unwrap();
        assert_eq!(small.file("small.bin").unwrap().size, allocated("data/small.bin"));
        assert_eq!(root.size, allocated("sparse.img") + allocated("data/small.bin"));
        assert_aggregation(&index);
    }

    #[test]
    fn quick_scan_picks_up_deep_changes() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("a/b/c.txt"), 1);
        let index = index_for(&temp, SourceConfig::default());
        index.index_directory("/", false, true).unwrap();

        write_file(&temp.path().join("a/b/d.txt"), 4);
        let report = index.index_directory("/", true, true).unwrap();

        assert!(report.files_changed);
        assert_eq!(index.get_directory("/a/b").unwrap().size, 5);
        assert_eq!(index.get_directory("/a").unwrap().size, 5);
        assert_eq!(index.get_directory("/").unwrap().size, 5);
        assert_aggregation(&index);
    }
}
