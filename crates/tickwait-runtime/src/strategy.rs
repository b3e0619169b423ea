//! Wait strategies.
//!
//! A strategy spins until the clock reaches a target tick, using whatever
//! wait instruction its architecture offers:
//!
//! - [`NativeRetrySleep`]: a sleep instruction whose delay is only loosely
//!   bounded (zero to twice the request). Re-issued with a shrinking budget
//!   until the target is reached.
//! - [`CoarsePollingSleep`]: a fixed idle instruction of unknown length.
//!   Issued repeatedly between clock polls; never sized to the time left.
//! - [`Unsupported`]: no instruction at all; reports that nothing was slept.
//!
//! [`TargetStrategy`] is picked by `cfg(target_arch)` at build time.

use tickwait_common::{ClockRate, StrategyKind, TickCount};

use crate::hardware::{IdleHint, WaitHardware};

/// Where one timed wait starts and must end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTarget {
    /// Clock reading when the wait began.
    pub start: TickCount,
    /// First tick at which the request is covered.
    pub end: TickCount,
    /// Requested duration in nanoseconds.
    pub nsecs: u64,
    /// Clock rate used for every conversion.
    pub rate: ClockRate,
}

impl WaitTarget {
    /// Target for `nsecs` nanoseconds from `start`, rounded up to whole ticks.
    #[must_use]
    pub const fn new(start: TickCount, nsecs: u64, rate: ClockRate) -> Self {
        Self {
            start,
            end: start.saturating_add(rate.ticks_for_nanos(nsecs)),
            nsecs,
            rate,
        }
    }

    /// Whether `now` is at or past the end tick.
    #[must_use]
    pub fn reached(&self, now: TickCount) -> bool {
        now >= self.end
    }

    /// Nanoseconds elapsed between `start` and `now`, zero if the clock
    /// went backwards.
    #[must_use]
    pub const fn elapsed_nanos(&self, now: TickCount) -> u64 {
        self.rate.nanos_for_ticks(now.saturating_ticks_since(self.start))
    }

    /// Nanoseconds of the request not yet covered at `now`.
    #[must_use]
    pub const fn remaining_nanos(&self, now: TickCount) -> u64 {
        self.nsecs.saturating_sub(self.elapsed_nanos(now))
    }
}

/// How a strategy finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitProgress {
    /// The loop exited; holds the last clock reading it saw.
    Reached(TickCount),
    /// No wait primitive; nothing was slept.
    Unsupported,
}

/// One way of spending time until a target tick.
pub trait WaitStrategy {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Block until `target.end` or give up.
    fn wait<H: WaitHardware + ?Sized>(&self, hw: &H, target: &WaitTarget) -> WaitProgress;
}

/// Native sleep instruction, re-issued until the target tick is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRetrySleep;

impl WaitStrategy for NativeRetrySleep {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Native
    }

    fn wait<H: WaitHardware + ?Sized>(&self, hw: &H, target: &WaitTarget) -> WaitProgress {
        let mut budget = target.nsecs;
        let mut cur = hw.now();
        while !target.reached(cur) {
            // Below the capability gate this degrades to pure polling.
            if hw.native_sleep_available() {
                hw.native_sleep(u32::try_from(budget).unwrap_or(u32::MAX));
            }
            cur = hw.now();
            budget = target.remaining_nanos(cur);
        }
        WaitProgress::Reached(cur)
    }
}

/// Fixed-size idle instruction polled until the target tick is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoarsePollingSleep;

impl WaitStrategy for CoarsePollingSleep {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Coarse
    }

    fn wait<H: WaitHardware + ?Sized>(&self, hw: &H, target: &WaitTarget) -> WaitProgress {
        let mut cur = hw.now();
        hw.idle(IdleHint::WarmUp);
        while !target.reached(cur) {
            hw.idle(IdleHint::Poll);
            cur = hw.now();
        }
        WaitProgress::Reached(cur)
    }
}

/// No wait primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl WaitStrategy for Unsupported {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Unsupported
    }

    fn wait<H: WaitHardware + ?Sized>(&self, _hw: &H, _target: &WaitTarget) -> WaitProgress {
        WaitProgress::Unsupported
    }
}

/// Runtime selection, for host emulation only. Target builds use
/// [`TargetStrategy`].
impl WaitStrategy for StrategyKind {
    fn kind(&self) -> StrategyKind {
        *self
    }

    fn wait<H: WaitHardware + ?Sized>(&self, hw: &H, target: &WaitTarget) -> WaitProgress {
        match self {
            StrategyKind::Native => NativeRetrySleep.wait(hw, target),
            StrategyKind::Coarse => CoarsePollingSleep.wait(hw, target),
            StrategyKind::Unsupported => Unsupported.wait(hw, target),
        }
    }
}

/// Strategy of the architecture being built.
#[cfg(target_arch = "nvptx64")]
pub type TargetStrategy = NativeRetrySleep;

/// Strategy of the architecture being built.
#[cfg(target_arch = "amdgpu")]
pub type TargetStrategy = CoarsePollingSleep;

/// Strategy of the architecture being built.
#[cfg(not(any(target_arch = "nvptx64", target_arch = "amdgpu")))]
pub type TargetStrategy = Unsupported;
