//! Adaptive re-scan cadence as a pure state machine.

use std::time::Duration;

use serde::Serialize;

use crate::types::duration_ms;

const MINUTE: Duration = Duration::from_secs(60);

/// Sleep durations between scans, shortest first.
pub const SCHEDULE_TIERS: [Duration; 8] = [
    Duration::from_secs(5 * 60),
    Duration::from_secs(10 * 60),
    Duration::from_secs(20 * 60),
    Duration::from_secs(40 * 60),
    Duration::from_secs(60 * 60),
    Duration::from_secs(2 * 60 * 60),
    Duration::from_secs(3 * 60 * 60),
    Duration::from_secs(4 * 60 * 60),
];

/// Churn never pulls the schedule below this tier (20 minutes).
pub const ANCHOR_TIER: usize = 2;

pub const INITIAL_TIER: usize = 3;

/// Every n-th scan is a full scan; the rest are quick.
pub const FULL_SCAN_EVERY: u64 = 5;

/// Shortest delay a `simple` source can reach after its modifier is applied.
pub const MIN_DELAY: Duration = MINUTE;

const SIMPLE_MAX_ELAPSED: Duration = Duration::from_secs(2);
const SIMPLE_MAX_DIRS: u64 = 1_000;
const COMPLEX_MIN_ELAPSED: Duration = Duration::from_secs(120);
const COMPLEX_MIN_DIRS: u64 = 500_000;
const SIMPLE_MODIFIER: Duration = Duration::from_secs(4 * 60);

/// Qualitative size of a source, derived from the last full scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Normal,
    Complex,
}

impl Complexity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Normal => "normal",
            Self::Complex => "complex",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    Quick,
    Full,
}

impl ScanKind {
    pub fn is_quick(self) -> bool {
        self == Self::Quick
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
        }
    }
}

/// Classifies a source from the wall-clock time and directory count of a full scan.
///
/// Returns the complexity and its smart modifier.
pub fn assess_complexity(elapsed: Duration, dirs: u64) -> (Complexity, Duration) {
    if elapsed < SIMPLE_MAX_ELAPSED || dirs < SIMPLE_MAX_DIRS {
        (Complexity::Simple, SIMPLE_MODIFIER)
    } else if elapsed > COMPLEX_MIN_ELAPSED || dirs > COMPLEX_MIN_DIRS {
        let minutes = (elapsed.as_secs() / 10 / 60).max(1);
        (Complexity::Complex, MINUTE * minutes as u32)
    } else {
        (Complexity::Normal, Duration::ZERO)
    }
}

/// Scheduling state for one source.
#[derive(Debug, Clone)]
pub struct Schedule {
    tier: usize,
    smart_modifier: Duration,
    complexity: Complexity,
    iteration: u64,
    last_scan: Option<Duration>,
    last_full_scan: Option<Duration>,
    last_full_scan_at: Option<u64>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            tier: INITIAL_TIER,
            smart_modifier: Duration::ZERO,
            complexity: Complexity::Normal,
            iteration: 0,
            last_scan: None,
            last_full_scan: None,
            last_full_scan_at: None,
        }
    }
}

impl Schedule {
    /// The first scan and every `FULL_SCAN_EVERY`-th after it are full scans.
    pub fn next_scan_kind(&self) -> ScanKind {
        if self.iteration % FULL_SCAN_EVERY == 0 {
            ScanKind::Full
        } else {
            ScanKind::Quick
        }
    }

    /// Time to wait before the next scan.
    pub fn next_delay(&self) -> Duration {
        let base = SCHEDULE_TIERS[self.tier];
        match self.complexity {
            Complexity::Simple => base.saturating_sub(self.smart_modifier).max(MIN_DELAY),
            Complexity::Normal => base,
            Complexity::Complex => base + self.smart_modifier,
        }
    }

    /// Applies the outcome of a completed scan.
    pub fn record_scan(
        &mut self,
        kind: ScanKind,
        files_changed: bool,
        dirs: u64,
        elapsed: Duration,
        finished_at: u64,
    ) {
        if files_changed {
            self.tier = self.tier.min(ANCHOR_TIER);
        } else {
            self.tier = (self.tier + 1).min(SCHEDULE_TIERS.len() - 1);
        }

        self.last_scan = Some(elapsed);
        if kind == ScanKind::Full {
            let (complexity, modifier) = assess_complexity(elapsed, dirs);
            self.complexity = complexity;
            self.smart_modifier = modifier;
            self.last_full_scan = Some(elapsed);
            self.last_full_scan_at = Some(finished_at);
        }
        self.iteration += 1;
    }

    /// A failed scan keeps the current cadence.
    pub fn record_failure(&mut self, elapsed: Duration) {
        self.last_scan = Some(elapsed);
        self.iteration += 1;
    }

    pub fn tier(&self) -> usize {
        self.tier
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn complexity(&self) -> Complexity {
        self.complexity
    }

    pub fn smart_modifier(&self) -> Duration {
        self.smart_modifier
    }

    pub fn last_scan_ms(&self) -> Option<u64> {
        self.last_scan.map(duration_ms)
    }

    pub fn last_full_scan_ms(&self) -> Option<u64> {
        self.last_full_scan.map(duration_ms)
    }

    pub fn last_full_scan_at(&self) -> Option<u64> {
        self.last_full_scan_at
    }
}
