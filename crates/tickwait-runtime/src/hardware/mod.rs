//! Hardware capabilities a timed wait depends on.
//!
//! The core never touches an intrinsic directly: it reads the clock and
//! issues wait instructions through [`WaitHardware`], so the same tick
//! arithmetic runs against the real target bindings, the host emulation,
//! and the deterministic [`SimulatedHardware`](crate::sim::SimulatedHardware).
//!
//! [`TargetHardware`] names the binding for the architecture being built:
//!
//! | target | clock | native sleep | idle |
//! |--------|-------|--------------|------|
//! | `nvptx64` | `%globaltimer` | `nanosleep.u32` (`sm_70`+) | - |
//! | `amdgpu` | `s_memrealtime` | - | `s_sleep` |
//! | other, `std` | host monotonic clock | - | - |
//! | other, `no_std` | none (reads zero) | - | - |

use tickwait_common::{TickCount, TICKS_PER_SEC};

#[cfg(target_arch = "amdgpu")]
pub mod amdgpu;
#[cfg(feature = "std")]
pub mod host;
#[cfg(target_arch = "nvptx64")]
pub mod nvptx;

#[cfg(feature = "std")]
pub use host::{EmulatedHardware, HostClock};

/// A monotonic counter incrementing at a constant, known rate.
pub trait FixedFrequencyClock {
    /// Clock frequency in Hz; zero when not (yet) known.
    fn frequency_hz(&self) -> u64;

    /// Current counter value. Never decreases between calls on one thread.
    fn now(&self) -> TickCount;
}

/// Size of a fixed idle instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleHint {
    /// Short idle issued once before polling starts.
    WarmUp,
    /// Longer idle issued between clock polls.
    Poll,
}

/// Clock plus the wait instructions a target offers.
///
/// The defaults describe a target with no wait primitive at all.
pub trait WaitHardware: FixedFrequencyClock {
    /// Whether the native sleep instruction passes its capability gate.
    fn native_sleep_available(&self) -> bool {
        false
    }

    /// Sleep for somewhere between zero and twice `nanos`.
    ///
    /// Only called when [`native_sleep_available`](Self::native_sleep_available)
    /// returns true.
    fn native_sleep(&self, nanos: u32) {
        let _ = nanos;
    }

    /// Issue a fixed-size idle instruction of unknown duration.
    fn idle(&self, hint: IdleHint) {
        let _ = hint;
        core::hint::spin_loop();
    }
}

impl<T: FixedFrequencyClock + ?Sized> FixedFrequencyClock for &T {
    fn frequency_hz(&self) -> u64 {
        (**self).frequency_hz()
    }

    fn now(&self) -> TickCount {
        (**self).now()
    }
}

impl<T: WaitHardware + ?Sized> WaitHardware for &T {
    fn native_sleep_available(&self) -> bool {
        (**self).native_sleep_available()
    }

    fn native_sleep(&self, nanos: u32) {
        (**self).native_sleep(nanos);
    }

    fn idle(&self, hint: IdleHint) {
        (**self).idle(hint);
    }
}

/// Clock for `no_std` builds on targets without a known counter.
///
/// Reports a nominal 1 GHz rate so that requests still validate and reach
/// the unsupported strategy, which returns them unslept.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClock;

impl FixedFrequencyClock for NullClock {
    fn frequency_hz(&self) -> u64 {
        TICKS_PER_SEC
    }

    fn now(&self) -> TickCount {
        TickCount(0)
    }
}

impl WaitHardware for NullClock {}

/// Hardware binding of the architecture being built.
#[cfg(target_arch = "nvptx64")]
pub type TargetHardware = nvptx::NvptxHardware;

/// Hardware binding of the architecture being built.
#[cfg(target_arch = "amdgpu")]
pub type TargetHardware = amdgpu::AmdgpuHardware;

/// Hardware binding of the architecture being built.
#[cfg(all(
    not(any(target_arch = "nvptx64", target_arch = "amdgpu")),
    feature = "std"
))]
pub type TargetHardware = host::HostClock;

/// Hardware binding of the architecture being built.
#[cfg(all(
    not(any(target_arch = "nvptx64", target_arch = "amdgpu")),
    not(feature = "std")
))]
pub type TargetHardware = NullClock;
