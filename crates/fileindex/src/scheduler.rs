//! Adaptive re-scan scheduling.
//!
//! `Schedule` decides how long to wait and whether the next scan is quick or
//! full; `Scheduler` drives it on a background thread. Scans alternate four
//! quick passes with one full pass, back off while a source is quiet, and
//! return to the 20 minute anchor tier when changes are seen.

mod clock;
mod runner;
mod schedule;

pub use clock::{Clock, ManualClock, SystemClock};
pub use runner::{run_scan, Scheduler};
pub(crate) use runner::ScanSignal;
pub use schedule::{
    assess_complexity, Complexity, ScanKind, Schedule, ANCHOR_TIER, FULL_SCAN_EVERY,
    INITIAL_TIER, MIN_DELAY, SCHEDULE_TIERS,
};
