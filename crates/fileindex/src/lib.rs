//! Filesystem indexing, search, and artifact cache library.
//!
//! This crate provides the storage side of a web file manager:
//! - In-memory per-source directory index with aggregate sizes
//! - Adaptive background re-scans (quick and full passes)
//! - Substring search with type and size filters, superseded per session
//! - Sharded on-disk cache for derived artifacts such as thumbnails

pub mod cache;
pub mod cancel;
pub mod config;
pub mod error;
pub mod file_type;
pub mod index;
pub mod manager;
pub mod path;
pub mod scheduler;
pub mod search;
pub mod types;

// Re-export main types
pub use cache::DiskCache;
pub use cancel::{SearchSessions, SessionToken};
pub use config::{DiskCacheConfig, ExcludeRules, IncludeRules, SizeBasis, Source, SourceConfig};
pub use error::{FilesystemError, Result};
pub use file_type::FileKind;
pub use index::{Index, RealPath, ScanReport};
pub use manager::IndexManager;
pub use scheduler::{Clock, Complexity, ScanKind, Schedule, Scheduler, SystemClock};
pub use search::{SearchEngine, SearchQuery};
pub use types::{DirectoryInfo, IndexStats, ItemInfo, SearchHit};
