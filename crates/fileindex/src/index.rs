//! Per-source filesystem index.
//!
//! ## Module Structure
//!
//! - `data` - `Index` state: directory map, counters, locks
//! - `rules` - Inclusion/exclusion rules, hidden and bundle detection
//! - `walk` - Post-order directory walk (`index_directory`)
//! - `refresh` - Single-item refresh with ancestor size propagation
//! - `metadata` - Lookups and real path resolution

mod data;
mod metadata;
mod refresh;
mod rules;
mod walk;

pub use data::{Index, IndexCounters};
pub use metadata::RealPath;
pub use rules::{is_bundle, is_hidden, EntryRules, RESERVED_DIRECTORIES};
pub use walk::ScanReport;
