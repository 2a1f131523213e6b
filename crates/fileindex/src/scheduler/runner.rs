//! Background scan loop, one thread per source.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::clock::Clock;
use super::schedule::ScanKind;
use crate::error::Result;
use crate::index::Index;
use crate::path::ROOT_PATH;
use crate::types::duration_ms;

#[derive(Debug, Default)]
struct SignalState {
    stop: bool,
    trigger: bool,
    completed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Scan,
    Stop,
}

/// Wakes the scan loop early and reports finished scans.
#[derive(Debug, Default)]
pub(crate) struct ScanSignal {
    state: Mutex<SignalState>,
    wake: Condvar,
    progress: Condvar,
}

impl ScanSignal {
    fn wait(&self, timeout: Duration) -> Wake {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.stop {
                return Wake::Stop;
            }
            if state.trigger {
                state.trigger = false;
                return Wake::Scan;
            }
            if self.wake.wait_until(&mut state, deadline).timed_out() {
                return if state.stop { Wake::Stop } else { Wake::Scan };
            }
        }
    }

    fn trigger(&self) {
        self.state.lock().trigger = true;
        self.wake.notify_all();
    }

    fn stop(&self) {
        self.state.lock().stop = true;
        self.wake.notify_all();
        self.progress.notify_all();
    }

    fn is_stopped(&self) -> bool {
        self.state.lock().stop
    }

    fn scan_completed(&self) {
        self.state.lock().completed += 1;
        self.progress.notify_all();
    }

    fn completed(&self) -> u64 {
        self.state.lock().completed
    }

    /// Returns false on timeout, or once the loop stops short of `count`.
    pub(crate) fn wait_for_scans(&self, count: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.completed < count {
            if state.stop {
                return false;
            }
            if self.progress.wait_until(&mut state, deadline).timed_out() {
                return state.completed >= count;
            }
        }
        true
    }
}

/// Handle to a running scan loop. Dropping it stops and joins the thread.
#[derive(Debug)]
pub struct Scheduler {
    source: String,
    signal: Arc<ScanSignal>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns the loop. The first scan is a full scan and starts immediately.
    pub fn start(index: Arc<Index>, clock: Arc<dyn Clock>) -> Result<Self> {
        let signal = Arc::new(ScanSignal::default());
        let source = index.name().to_string();
        let thread_signal = signal.clone();
        let handle = thread::Builder::new()
            .name(format!("fileindex-scan-{source}"))
            .spawn(move || run_loop(index, thread_signal, clock))?;

        log::info!("filesystem scheduler started source={source}");
        Ok(Self {
            source,
            signal,
            handle: Some(handle),
        })
    }

    /// Runs the next scan now instead of waiting for the current delay.
    pub fn trigger(&self) {
        self.signal.trigger();
    }

    pub fn completed_scans(&self) -> u64 {
        self.signal.completed()
    }

    /// Blocks until at least `count` scans have finished or `timeout` elapses.
    pub fn wait_for_scans(&self, count: u64, timeout: Duration) -> bool {
        self.signal.wait_for_scans(count, timeout)
    }

    /// Shared handle for waiting on scan progress without holding the scheduler.
    pub(crate) fn signal(&self) -> Arc<ScanSignal> {
        self.signal.clone()
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.signal.stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("filesystem scheduler thread panicked source={}", self.source);
            }
            log::info!("filesystem scheduler stopped source={}", self.source);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(index: Arc<Index>, signal: Arc<ScanSignal>, clock: Arc<dyn Clock>) {
    loop {
        if signal.is_stopped() {
            break;
        }
        run_scan(&index, clock.as_ref());
        signal.scan_completed();

        let delay = index.schedule.lock().next_delay();
        log::debug!(
            "filesystem scheduler sleeping source={} delay_secs={}",
            index.name(),
            delay.as_secs()
        );
        if signal.wait(delay) == Wake::Stop {
            break;
        }
    }
}

/// Runs the scan the schedule calls for and records its outcome.
///
/// Errors and panics are logged; they never escape the loop.
pub fn run_scan(index: &Index, clock: &dyn Clock) -> ScanKind {
    let kind = index.schedule.lock().next_scan_kind();
    let started = clock.now();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        index.index_directory(ROOT_PATH, kind.is_quick(), true)
    }));
    let elapsed = clock.now().saturating_duration_since(started);

    let mut schedule = index.schedule.lock();
    match result {
        Ok(Ok(report)) => {
            schedule.record_scan(
                kind,
                report.files_changed,
                report.dirs,
                elapsed,
                clock.unix_now_secs(),
            );
            log::info!(
                "filesystem index scan source={} kind={} elapsed_ms={} dirs={} files={} removed={} changed={} complexity={} next_delay_secs={}",
                index.name(),
                kind.as_str(),
                duration_ms(elapsed),
                report.dirs,
                report.files,
                report.removed,
                report.files_changed,
                schedule.complexity().as_str(),
                schedule.next_delay().as_secs(),
            );
        }
        Ok(Err(error)) => {
            schedule.record_failure(elapsed);
            log::warn!(
                "filesystem index scan failed source={} kind={} error={}",
                index.name(),
                kind.as_str(),
                error
            );
        }
        Err(_) => {
            schedule.record_failure(elapsed);
            log::warn!(
                "filesystem index scan panicked source={} kind={}",
                index.name(),
                kind.as_str()
            );
        }
    }
    kind
}
