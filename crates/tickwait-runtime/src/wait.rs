//! The timed wait.
//!
//! [`TimedWait`] converts a requested [`Timespec`] into a tick target on a
//! fixed-frequency clock, hands it to a [`WaitStrategy`], and then measures
//! what actually elapsed. It never reports success for a wait that the
//! clock says was short: any shortfall is written back to the caller as the
//! remaining duration, the same way POSIX `nanosleep` reports an
//! interrupted sleep.
//!
//! # Example
//!
//! ```
//! use tickwait_runtime::{NativeRetrySleep, SimulatedHardware, TimedWait, Timespec};
//!
//! let hw = SimulatedHardware::new(1_000_000_000);
//! let sleeper = TimedWait::new(&hw, NativeRetrySleep);
//!
//! let report = sleeper.wait(&Timespec::new(0, 1_000), None).unwrap();
//! assert!(report.elapsed_ns >= 1_000);
//! ```

use tickwait_common::error::STATUS_OK;
use tickwait_common::{ClockRate, InvalidArgument, TickCount, Timespec, WaitError, WaitResult};

use crate::hardware::{TargetHardware, WaitHardware};
use crate::strategy::{TargetStrategy, WaitProgress, WaitStrategy, WaitTarget};

/// Outcome of a wait that covered the full request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitReport {
    /// Requested duration in nanoseconds.
    pub requested_ns: u64,
    /// Tick-derived nanoseconds between the first and last clock reads.
    pub elapsed_ns: u64,
    /// Clock ticks between the first and last reads.
    pub ticks: u64,
}

impl WaitReport {
    /// How far past the request the wait ran.
    #[must_use]
    pub const fn overshoot_ns(&self) -> u64 {
        self.elapsed_ns.saturating_sub(self.requested_ns)
    }
}

/// A timed wait bound to one clock and one strategy.
///
/// Holds no mutable state; a single instance can serve any number of
/// concurrent sleepers when `H` and `S` are `Sync`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedWait<H, S> {
    hardware: H,
    strategy: S,
}

impl TimedWait<TargetHardware, TargetStrategy> {
    /// The clock and strategy of the architecture being built.
    #[must_use]
    pub fn target() -> Self {
        Self::new(TargetHardware::default(), TargetStrategy::default())
    }
}

impl<H: WaitHardware, S: WaitStrategy> TimedWait<H, S> {
    /// Bind `hardware` and `strategy`.
    #[must_use]
    pub const fn new(hardware: H, strategy: S) -> Self {
        Self { hardware, strategy }
    }

    /// Validated rate of the bound clock.
    ///
    /// # Errors
    ///
    /// Fails if the clock frequency is unknown or finer than a nanosecond.
    pub fn clock_rate(&self) -> Result<ClockRate, InvalidArgument> {
        ClockRate::new(self.hardware.frequency_hz())
    }

    /// Block for at least `requested`.
    ///
    /// `remaining` is written only when the wait returns early, with the
    /// same remainder carried by the error. On success, or when the
    /// arguments are rejected, it is left untouched.
    ///
    /// # Errors
    ///
    /// - [`WaitError::InvalidArgument`] if the clock rate is unusable;
    ///   nothing was slept.
    /// - [`WaitError::Undershoot`] if the clock shows less than the request
    ///   elapsed.
    /// - [`WaitError::Unsupported`] if the strategy has no wait primitive;
    ///   the remainder is the full request.
    pub fn wait(
        &self,
        requested: &Timespec,
        remaining: Option<&mut Timespec>,
    ) -> WaitResult<WaitReport> {
        let rate = self.clock_rate()?;
        let nsecs = requested.as_nanos_saturating();

        let start = self.hardware.now();
        let target = WaitTarget::new(start, nsecs, rate);

        if self.strategy.wait(&self.hardware, &target) == WaitProgress::Unsupported {
            if let Some(rem) = remaining {
                *rem = *requested;
            }
            return Err(WaitError::Unsupported {
                remaining: *requested,
            });
        }

        let stop = self.hardware.now();
        self.settle(&target, stop, remaining)
    }

    /// [`TimedWait::wait`] with the request passed the way a C caller does,
    /// `None` standing in for a null pointer.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument::MissingDuration`] for a missing request, otherwise
    /// as [`TimedWait::wait`].
    pub fn wait_nullable(
        &self,
        requested: Option<&Timespec>,
        remaining: Option<&mut Timespec>,
    ) -> WaitResult<WaitReport> {
        let requested = requested.ok_or(InvalidArgument::MissingDuration)?;
        self.wait(requested, remaining)
    }

    /// POSIX-style entry point: `0` when the full duration elapsed, `-1`
    /// otherwise. `None` for `req` stands in for a null pointer.
    pub fn nanosleep(&self, req: Option<&Timespec>, rem: Option<&mut Timespec>) -> i32 {
        match self.wait_nullable(req, rem) {
            Ok(_) => STATUS_OK,
            Err(err) => err.status(),
        }
    }

    // Shortfall is measured against the original request, not whatever
    // budget the strategy was left with.
    fn settle(
        &self,
        target: &WaitTarget,
        stop: TickCount,
        remaining: Option<&mut Timespec>,
    ) -> WaitResult<WaitReport> {
        let ticks = stop.saturating_ticks_since(target.start);
        let elapsed_ns = target.rate.nanos_for_ticks(ticks);

        if elapsed_ns < target.nsecs {
            let shortfall = Timespec::from_nanos(target.nsecs - elapsed_ns);
            if let Some(rem) = remaining {
                *rem = shortfall;
            }
            return Err(WaitError::Undershoot {
                remaining: shortfall,
            });
        }

        Ok(WaitReport {
            requested_ns: target.nsecs,
            elapsed_ns,
            ticks,
        })
    }
}

/// Block for at least `requested` using the build target's clock and
/// strategy.
///
/// # Errors
///
/// See [`TimedWait::wait`].
pub fn timed_wait(
    requested: &Timespec,
    remaining: Option<&mut Timespec>,
) -> WaitResult<WaitReport> {
    TimedWait::<TargetHardware, TargetStrategy>::target().wait(requested, remaining)
}

/// POSIX `nanosleep` on the build target's clock and strategy.
pub fn nanosleep(req: Option<&Timespec>, rem: Option<&mut Timespec>) -> i32 {
    TimedWait::<TargetHardware, TargetStrategy>::target().nanosleep(req, rem)
}
