//! Deterministic wait hardware for tests.
//!
//! The clock only moves when something reads it or waits on it: scripted
//! readings are returned first, after which every read advances the clock
//! by a fixed step. Native sleeps and idles advance it by configurable
//! amounts, so a test can reproduce an exact undershoot or overshoot.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam_utils::CachePadded;
use tickwait_common::{TickCount, TICKS_PER_SEC};

use crate::hardware::{FixedFrequencyClock, IdleHint, WaitHardware};

/// Scriptable clock plus wait instructions.
///
/// Safe to share between threads; all sleepers see the same clock.
#[derive(Debug)]
pub struct SimulatedHardware {
    frequency_hz: u64,
    clock: CachePadded<AtomicU64>,
    script: Mutex<VecDeque<u64>>,
    advance_per_read: u64,
    native_sleep: bool,
    native_sleep_percent: u64,
    warm_up_ticks: u64,
    poll_ticks: u64,
    clock_reads: AtomicU64,
    native_sleeps: AtomicU64,
    warm_up_idles: AtomicU64,
    poll_idles: AtomicU64,
    last_native_request: AtomicU64,
}

impl SimulatedHardware {
    /// A stopped clock at `frequency_hz` whose native sleep is exact.
    #[must_use]
    pub fn new(frequency_hz: u64) -> Self {
        Self {
            frequency_hz,
            clock: CachePadded::new(AtomicU64::new(0)),
            script: Mutex::new(VecDeque::new()),
            advance_per_read: 0,
            native_sleep: true,
            native_sleep_percent: 100,
            warm_up_ticks: 2,
            poll_ticks: 15,
            clock_reads: AtomicU64::new(0),
            native_sleeps: AtomicU64::new(0),
            warm_up_idles: AtomicU64::new(0),
            poll_idles: AtomicU64::new(0),
            last_native_request: AtomicU64::new(0),
        }
    }

    /// Readings returned, in order, by the next clock reads.
    ///
    /// A scripted reading replaces the clock value, so a script can also
    /// move time backwards.
    #[must_use]
    pub fn with_script(self, readings: impl IntoIterator<Item = u64>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(readings);
        self
    }

    /// Ticks the clock moves forward after each unscripted read.
    #[must_use]
    pub fn with_advance_per_read(mut self, ticks: u64) -> Self {
        self.advance_per_read = ticks;
        self
    }

    /// Enable or disable the native sleep capability gate.
    #[must_use]
    pub fn with_native_sleep(mut self, available: bool) -> Self {
        self.native_sleep = available;
        self
    }

    /// Percentage of each requested native sleep that actually elapses.
    #[must_use]
    pub fn with_native_sleep_percent(mut self, percent: u64) -> Self {
        self.native_sleep_percent = percent.min(200);
        self
    }

    /// Ticks consumed by the warm-up and polling idles.
    #[must_use]
    pub fn with_idle_ticks(mut self, warm_up: u64, poll: u64) -> Self {
        self.warm_up_ticks = warm_up;
        self.poll_ticks = poll;
        self
    }

    /// Move the clock forward by `ticks`.
    pub fn advance(&self, ticks: u64) {
        // fetch_update never fails when the closure always returns Some
        let _ = self
            .clock
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| {
                Some(t.saturating_add(ticks))
            });
    }

    /// Current clock value without counting a read.
    #[must_use]
    pub fn peek(&self) -> TickCount {
        TickCount(self.clock.load(Ordering::Acquire))
    }

    /// Number of clock reads so far.
    #[must_use]
    pub fn clock_reads(&self) -> u64 {
        self.clock_reads.load(Ordering::Relaxed)
    }

    /// Number of native sleeps issued.
    #[must_use]
    pub fn native_sleeps(&self) -> u64 {
        self.native_sleeps.load(Ordering::Relaxed)
    }

    /// Nanoseconds requested by the most recent native sleep.
    #[must_use]
    pub fn last_native_request(&self) -> u64 {
        self.last_native_request.load(Ordering::Relaxed)
    }

    /// Number of warm-up idles issued.
    #[must_use]
    pub fn warm_up_idles(&self) -> u64 {
        self.warm_up_idles.load(Ordering::Relaxed)
    }

    /// Number of polling idles issued.
    #[must_use]
    pub fn poll_idles(&self) -> u64 {
        self.poll_idles.load(Ordering::Relaxed)
    }

    fn ticks_for_nanos(&self, nanos: u64) -> u64 {
        let ticks = (u128::from(nanos) * u128::from(self.frequency_hz))
            .div_ceil(u128::from(TICKS_PER_SEC));
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }
}

impl FixedFrequencyClock for SimulatedHardware {
    fn frequency_hz(&self) -> u64 {
        self.frequency_hz
    }

    fn now(&self) -> TickCount {
        self.clock_reads.fetch_add(1, Ordering::Relaxed);

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(reading) = scripted {
            self.clock.store(reading, Ordering::Release);
            return TickCount(reading);
        }

        let reading = self.peek();
        self.advance(self.advance_per_read);
        reading
    }
}

impl WaitHardware for SimulatedHardware {
    fn native_sleep_available(&self) -> bool {
        self.native_sleep
    }

    fn native_sleep(&self, nanos: u32) {
        self.native_sleeps.fetch_add(1, Ordering::Relaxed);
        self.last_native_request.store(u64::from(nanos), Ordering::Relaxed);

        let slept = (u64::from(nanos) * self.native_sleep_percent).div_ceil(100);
        self.advance(self.ticks_for_nanos(slept));
    }

    fn idle(&self, hint: IdleHint) {
        let ticks = match hint {
            IdleHint::WarmUp => {
                self.warm_up_idles.fetch_add(1, Ordering::Relaxed);
                self.warm_up_ticks
            }
            IdleHint::Poll => {
                self.poll_idles.fetch_add(1, Ordering::Relaxed);
                self.poll_ticks
            }
        };
        self.advance(ticks);
    }
}
