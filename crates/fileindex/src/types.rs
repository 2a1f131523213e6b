//! Index data model and result types.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::file_type::FileKind;

/// Metadata for a single file or directory listed inside a directory.
///
/// Items are built during a walk or a refresh and replaced wholesale; they are
/// never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInfo {
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub hidden: bool,
}

impl ItemInfo {
    /// Returns a copy of this item with a different size.
    pub fn with_size(&self, size: u64) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

/// One indexed directory: its aggregate size and its direct children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryInfo {
    pub path: String,
    pub name: String,
    /// Direct file sizes plus the aggregate sizes of direct subdirectories.
    pub size: u64,
    pub modified: SystemTime,
    pub hidden: bool,
    pub files: Vec<ItemInfo>,
    pub folders: Vec<ItemInfo>,
}

impl DirectoryInfo {
    /// Reduced single-item view of this directory.
    pub fn as_item(&self) -> ItemInfo {
        ItemInfo {
            name: self.name.clone(),
            size: self.size,
            modified: self.modified,
            kind: FileKind::Directory,
            hidden: self.hidden,
        }
    }

    pub fn file(&self, name: &str) -> Option<&ItemInfo> {
        self.files.iter().find(|item| item.name == name)
    }

    pub fn folder(&self, name: &str) -> Option<&ItemInfo> {
        self.folders.iter().find(|item| item.name == name)
    }

    /// Recomputes the aggregate size from the direct children.
    pub fn children_size(&self) -> u64 {
        self.files
            .iter()
            .chain(self.folders.iter())
            .map(|item| item.size)
            .sum()
    }
}

/// A single search match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Path relative to the search scope, without a leading slash.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub size: u64,
}

/// Counters and scheduling state for one index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub source: String,
    pub num_dirs: u64,
    pub num_files: u64,
    pub removed: u64,
    pub complexity: crate::scheduler::Complexity,
    pub schedule_tier: usize,
    pub smart_modifier_secs: u64,
    pub last_scan_ms: Option<u64>,
    pub last_full_scan_ms: Option<u64>,
    pub last_full_scan_at: Option<u64>,
}

/// Returns the current Unix timestamp in seconds.
pub fn unix_now_secs() -> u64 {
    unix_secs(SystemTime::now())
}

/// Converts a timestamp into Unix seconds, clamping pre-epoch values to 0.
pub fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|value| value.as_secs())
        .unwrap_or(0)
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
