//! Host-side clock and wait-instruction emulation.
//!
//! [`HostClock`] is the target hardware on CPU builds: a nanosecond
//! monotonic clock with no wait instructions, so timed waits there take the
//! unsupported path. [`EmulatedHardware`] layers configurable sleep and idle
//! behaviour on top of it so the native and coarse strategies can be
//! exercised on a development machine.

use crossbeam_utils::Backoff;
use tickwait_common::config::{ConfigError, TickwaitConfig};
use tickwait_common::{TickCount, TICKS_PER_SEC};
use tracing::debug;

use super::{FixedFrequencyClock, IdleHint, WaitHardware};

/// Host monotonic clock in nanoseconds.
///
/// Uses `CLOCK_MONOTONIC_RAW` on Linux so NTP slewing does not bend the
/// timebase, and `std::time::Instant` elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostClock;

impl HostClock {
    /// Nanoseconds since an arbitrary fixed point.
    #[cfg(target_os = "linux")]
    #[must_use]
    pub fn now_nanos() -> u64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: clock_gettime only writes through the valid pointer we pass
        #[allow(unsafe_code)]
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC_RAW, &mut ts) };
        debug_assert_eq!(rc, 0, "CLOCK_MONOTONIC_RAW is always available on Linux");

        u64::try_from(ts.tv_sec)
            .unwrap_or(0)
            .saturating_mul(TICKS_PER_SEC)
            .saturating_add(u64::try_from(ts.tv_nsec).unwrap_or(0))
    }

    /// Nanoseconds since an arbitrary fixed point.
    #[cfg(not(target_os = "linux"))]
    #[must_use]
    pub fn now_nanos() -> u64 {
        static BASE: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
        let elapsed = BASE.get_or_init(std::time::Instant::now).elapsed();
        u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
    }
}

impl FixedFrequencyClock for HostClock {
    fn frequency_hz(&self) -> u64 {
        TICKS_PER_SEC
    }

    fn now(&self) -> TickCount {
        TickCount(Self::now_nanos())
    }
}

impl WaitHardware for HostClock {}

/// Accelerator wait instructions emulated on the host.
///
/// The clock is the host clock rescaled to `frequency_hz`. The native sleep
/// spins for `native_sleep_ratio` times the requested time, modelling the
/// instruction's zero-to-twice contract; idles spin a fixed number of
/// iterations regardless of how much time is left.
#[derive(Debug, Clone)]
pub struct EmulatedHardware {
    frequency_hz: u64,
    native_sleep: bool,
    native_sleep_ratio: f64,
    warm_up_spins: u32,
    poll_spins: u32,
}

impl EmulatedHardware {
    /// Emulate a clock at `frequency_hz` with an exact native sleep.
    #[must_use]
    pub fn new(frequency_hz: u64) -> Self {
        Self {
            frequency_hz,
            native_sleep: true,
            native_sleep_ratio: 1.0,
            warm_up_spins: 128,
            poll_spins: 960,
        }
    }

    /// Build from the `clock` and `emulation` configuration sections.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration does not validate.
    pub fn from_config(config: &TickwaitConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let emulation = &config.emulation;
        let hardware = Self {
            frequency_hz: config.clock.frequency_hz,
            native_sleep: emulation.native_sleep,
            native_sleep_ratio: emulation.native_sleep_ratio,
            warm_up_spins: emulation.warm_up_spins,
            poll_spins: emulation.poll_spins,
        };

        debug!(
            frequency_hz = hardware.frequency_hz,
            native_sleep = hardware.native_sleep,
            ratio = hardware.native_sleep_ratio,
            "Emulated wait hardware configured"
        );
        Ok(hardware)
    }

    /// Enable or disable the native sleep capability gate.
    #[must_use]
    pub fn with_native_sleep(mut self, available: bool) -> Self {
        self.native_sleep = available;
        self
    }

    /// Fraction of each requested native sleep actually spent, clamped to `[0, 2]`.
    #[must_use]
    pub fn with_native_sleep_ratio(mut self, ratio: f64) -> Self {
        self.native_sleep_ratio = if ratio.is_nan() { 1.0 } else { ratio.clamp(0.0, 2.0) };
        self
    }

    /// Spin counts of the warm-up and polling idles.
    #[must_use]
    pub fn with_idle_spins(mut self, warm_up: u32, poll: u32) -> Self {
        self.warm_up_spins = warm_up;
        self.poll_spins = poll;
        self
    }

    fn spin_for_nanos(nanos: u64) {
        let start = HostClock::now_nanos();
        let backoff = Backoff::new();
        while HostClock::now_nanos().saturating_sub(start) < nanos {
            backoff.spin();
        }
    }
}

impl FixedFrequencyClock for EmulatedHardware {
    fn frequency_hz(&self) -> u64 {
        self.frequency_hz
    }

    fn now(&self) -> TickCount {
        let ticks = u128::from(HostClock::now_nanos()) * u128::from(self.frequency_hz)
            / u128::from(TICKS_PER_SEC);
        TickCount(u64::try_from(ticks).unwrap_or(u64::MAX))
    }
}

impl WaitHardware for EmulatedHardware {
    fn native_sleep_available(&self) -> bool {
        self.native_sleep
    }

    fn native_sleep(&self, nanos: u32) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let actual = (f64::from(nanos) * self.native_sleep_ratio) as u64;
        Self::spin_for_nanos(actual);
    }

    fn idle(&self, hint: IdleHint) {
        let spins = match hint {
            IdleHint::WarmUp => self.warm_up_spins,
            IdleHint::Poll => self.poll_spins,
        };
        for _ in 0..spins {
            std::hint::spin_loop();
        }
    }
}
