//! Time source used to measure scans.

use std::time::{Duration, Instant};

use crate::types::unix_now_secs;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    fn unix_now_secs(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_now_secs(&self) -> u64 {
        unix_now_secs()
    }
}

/// A clock that only moves when told to.
///
/// `advance_per_read` makes every `now()` call step forward, which lets a
/// scan appear to take a chosen amount of time.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: parking_lot::Mutex<Duration>,
    advance_per_read: Duration,
    unix_origin: u64,
}

impl ManualClock {
    pub fn new(unix_origin: u64) -> Self {
        Self::with_step(unix_origin, Duration::ZERO)
    }

    pub fn with_step(unix_origin: u64, advance_per_read: Duration) -> Self {
        Self {
            origin: Instant::now(),
            offset: parking_lot::Mutex::new(Duration::ZERO),
            advance_per_read,
            unix_origin,
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let mut offset = self.offset.lock();
        let now = self.origin + *offset;
        *offset += self.advance_per_read;
        now
    }

    fn unix_now_secs(&self) -> u64 {
        self.unix_origin + self.offset.lock().as_secs()
    }
}
