//! IndexManager - one index and one scan loop per configured source.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Source;
use crate::error::{FilesystemError, Result};
use crate::index::{Index, RealPath};
use crate::scheduler::{run_scan, Clock, Scheduler, SystemClock};
use crate::search::SearchEngine;
use crate::types::{DirectoryInfo, IndexStats, ItemInfo, SearchHit};

/// Routes lookups, searches and refreshes to the index of a named source.
pub struct IndexManager {
    indexes: HashMap<String, Arc<Index>>,
    schedulers: Mutex<HashMap<String, Scheduler>>,
    engine: SearchEngine,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("sources", &self.source_names())
            .field("schedulers", &self.schedulers.lock().len())
            .field("clock", &"<clock>")
            .finish()
    }
}

impl IndexManager {
    pub fn new(sources: Vec<Source>) -> Result<Self> {
        Self::with_clock(sources, Arc::new(SystemClock))
    }

    /// Builds empty indexes for `sources`. Nothing is scanned until `start`.
    ///
    /// Each source is re-validated; an unreadable root or a duplicate name
    /// fails the whole manager.
    pub fn with_clock(sources: Vec<Source>, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut indexes = HashMap::with_capacity(sources.len());
        for source in sources {
            let source = source.resolve()?;
            let name = source.name.clone();
            if indexes.contains_key(&name) {
                return Err(FilesystemError::InvalidInput(format!(
                    "duplicate source name: {name}"
                )));
            }
            log::info!(
                "filesystem source configured source={} root={} disabled={}",
                name,
                source.path.display(),
                source.config.disabled
            );
            indexes.insert(name, Arc::new(Index::new(source)));
        }
        Ok(Self {
            indexes,
            schedulers: Mutex::new(HashMap::new()),
            engine: SearchEngine::new(),
            clock,
        })
    }

    /// Starts a scan loop for every enabled source that is not running yet.
    pub fn start(&self) -> Result<()> {
        let mut schedulers = self.schedulers.lock();
        for (name, index) in &self.indexes {
            if index.config().disabled || schedulers.contains_key(name) {
                continue;
            }
            let scheduler = Scheduler::start(index.clone(), self.clock.clone())?;
            schedulers.insert(name.clone(), scheduler);
        }
        Ok(())
    }

    /// Stops and joins every scan loop.
    pub fn stop(&self) {
        let schedulers: Vec<_> = self.schedulers.lock().drain().collect();
        for (_, scheduler) in schedulers {
            scheduler.stop();
        }
    }

    /// Requests an immediate scan of `source`.
    ///
    /// With a running scan loop the request is queued on it; otherwise the
    /// scan runs on the calling thread.
    pub fn scan_now(&self, source: &str) -> Result<()> {
        let index = self.index(source)?;
        if let Some(scheduler) = self.schedulers.lock().get(source) {
            scheduler.trigger();
            return Ok(());
        }
        run_scan(index, self.clock.as_ref());
        Ok(())
    }

    pub fn is_running(&self, source: &str) -> bool {
        self.schedulers.lock().contains_key(source)
    }

    /// Blocks until `source` has completed `count` scans in its loop.
    pub fn wait_for_scans(&self, source: &str, count: u64, timeout: Duration) -> bool {
        let signal = self.schedulers.lock().get(source).map(Scheduler::signal);
        match signal {
            Some(signal) => signal.wait_for_scans(count, timeout),
            None => false,
        }
    }

    pub fn source_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.indexes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the index for an enabled source.
    pub fn index(&self, source: &str) -> Result<&Arc<Index>> {
        let index = self
            .indexes
            .get(source)
            .ok_or_else(|| FilesystemError::UnknownSource(source.to_string()))?;
        if index.config().disabled {
            return Err(FilesystemError::SourceDisabled(source.to_string()));
        }
        Ok(index)
    }

    /// Searches one source. Unknown and disabled sources yield no results.
    pub fn search(
        &self,
        source: &str,
        query: &str,
        scope: &str,
        session_id: &str,
    ) -> Vec<SearchHit> {
        match self.index(source) {
            Ok(index) => self.engine.search(index, query, scope, session_id),
            Err(error) => {
                log::debug!("filesystem search skipped source={source} error={error}");
                Vec::new()
            }
        }
    }

    pub fn get_metadata_info(
        &self,
        source: &str,
        path: &str,
        is_dir: bool,
    ) -> Option<Arc<DirectoryInfo>> {
        self.index(source).ok()?.get_metadata_info(path, is_dir)
    }

    pub fn get_reduced_metadata(&self, source: &str, path: &str, is_dir: bool) -> Option<ItemInfo> {
        self.index(source).ok()?.get_reduced_metadata(path, is_dir)
    }

    pub fn refresh_file_info(&self, source: &str, path: &str, is_dir: bool) -> Result<()> {
        self.index(source)?.refresh_file_info(path, is_dir)
    }

    pub fn real_path(&self, source: &str, path: &str) -> Result<RealPath> {
        self.index(source)?.real_path(path)
    }

    /// Stats are available for disabled sources too.
    pub fn stats(&self, source: &str) -> Result<IndexStats> {
        self.indexes
            .get(source)
            .map(|index| index.stats())
            .ok_or_else(|| FilesystemError::UnknownSource(source.to_string()))
    }
}

impl Drop for IndexManager {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::file_type::FileKind;
    use crate::scheduler::ManualClock;
    use std::fs;
    use std::thread;
    use std::time::Instant;
    use tempfile::TempDir;

    fn source(name: &str, temp: &TempDir, disabled: bool) -> Source {
        let config = SourceConfig {
            disabled,
            ..SourceConfig::default()
        };
        Source::new(name, temp.path(), config).unwrap()
    }

    fn manual_manager(sources: Vec<Source>) -> IndexManager {
        IndexManager::with_clock(sources, Arc::new(ManualClock::new(0))).unwrap()
    }

    #[test]
    fn routes_by_source_name() {
        let photos = TempDir::new().unwrap();
        let music = TempDir::new().unwrap();
        fs::write(photos.path().join("cat.jpg"), b"meow").unwrap();
        fs::write(music.path().join("song.mp3"), b"la").unwrap();
        let manager = manual_manager(vec![
            source("photos", &photos, false),
            source("music", &music, false),
        ]);
        manager.scan_now("photos").unwrap();
        manager.scan_now("music").unwrap();

        let hits = manager.search("photos", "cat", "/", "s1");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, FileKind::Image);
        assert!(manager.search("music", "cat", "/", "s1").is_empty());

        let item = manager.get_reduced_metadata("music", "/song.mp3", false).unwrap();
        assert_eq!(item.size, 2);
        assert_eq!(manager.get_metadata_info("photos", "/", true).unwrap().size, 4);
        assert_eq!(manager.source_names(), vec!["music", "photos"]);
        assert_eq!(manager.stats("photos").unwrap().num_files, 1);
    }

    #[test]
    fn unknown_and_disabled_sources() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"a").unwrap();
        let manager = manual_manager(vec![source("off", &temp, true)]);

        assert!(manager.search("off", "", "/", "s1").is_empty());
        assert!(manager.search("nope", "", "/", "s1").is_empty());
        assert!(manager.get_metadata_info("off", "/", true).is_none());
        assert!(matches!(
            manager.refresh_file_info("off", "/a.txt", false),
            Err(FilesystemError::SourceDisabled(_))
        ));
        assert!(matches!(
            manager.real_path("nope", "/"),
            Err(FilesystemError::UnknownSource(_))
        ));
        assert!(manager.stats("off").is_ok());

        manager.start().unwrap();
        assert!(!manager.is_running("off"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let temp = TempDir::new().unwrap();
        let result = IndexManager::new(vec![
            source("same", &temp, false),
            source("same", &temp, false),
        ]);
        assert!(matches!(result, Err(FilesystemError::InvalidInput(_))));
    }

    #[test]
    fn refresh_keeps_index_current_between_scans() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        let manager = manual_manager(vec![source("main", &temp, false)]);
        manager.scan_now("main").unwrap();

        fs::write(temp.path().join("docs/new.txt"), b"hello").unwrap();
        manager.refresh_file_info("main", "/docs/new.txt", false).unwrap();

        assert_eq!(manager.get_metadata_info("main", "/", true).unwrap().size, 5);
        assert_eq!(manager.search("main", "new", "/", "s1").len(), 1);
    }

    #[test]
    fn waiting_for_scans_does_not_block_other_calls() {
        let temp = TempDir::new().unwrap();
        let manager = IndexManager::new(vec![source("main", &temp, false)]).unwrap();
        manager.start().unwrap();
        assert!(manager.wait_for_scans("main", 1, Duration::from_secs(10)));

        thread::scope(|scope| {
            let waiter =
                scope.spawn(|| manager.wait_for_scans("main", 1_000, Duration::from_secs(30)));
            thread::sleep(Duration::from_millis(50));

            let started = Instant::now();
            assert!(manager.is_running("main"));
            manager.stop();
            assert!(!waiter.join().unwrap());
            assert!(started.elapsed() < Duration::from_secs(10));
        });
        assert!(!manager.is_running("main"));
    }

    #[test]
    fn started_manager_scans_in_background() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"abc").unwrap();
        let manager = IndexManager::new(vec![source("main", &temp, false)]).unwrap();

        manager.start().unwrap();
        assert!(manager.is_running("main"));
        assert!(manager.wait_for_scans("main", 1, Duration::from_secs(10)));
        assert_eq!(manager.get_metadata_info("main", "/", true).unwrap().size, 3);

        manager.scan_now("main").unwrap();
        assert!(manager.wait_for_scans("main", 2, Duration::from_secs(10)));

        manager.stop();
        assert!(!manager.is_running("main"));
    }
}
