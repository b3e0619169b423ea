//! AMDGPU bindings.
//!
//! The clock is `s_memrealtime`, a constant-rate counter whose frequency
//! differs between chips and is not discoverable from device code. The
//! loader writes it into [`TICKWAIT_CLOCK_FREQUENCY`] before launching a
//! kernel; until then it reads zero and every wait is rejected.
//!
//! `s_sleep N` idles for roughly `64 * N` cycles with no documented bound,
//! so it is only used as a fixed-size poll interval.

use core::sync::atomic::{AtomicU64, Ordering};

use static_assertions::const_assert;
use tickwait_common::TickCount;

use super::{FixedFrequencyClock, IdleHint, WaitHardware};

/// `s_sleep` operand for the single warm-up idle.
pub const WARM_UP_SLEEP: i32 = 2;

/// `s_sleep` operand between clock polls, about 960 cycles.
pub const POLL_SLEEP: i32 = 15;

const_assert!(WARM_UP_SLEEP < POLL_SLEEP);

/// Frequency of `s_memrealtime` in Hz, published by the loader.
#[allow(unsafe_code)]
#[no_mangle]
pub static TICKWAIT_CLOCK_FREQUENCY: AtomicU64 = AtomicU64::new(0);

#[allow(improper_ctypes)]
extern "C" {
    #[link_name = "llvm.amdgcn.s.memrealtime"]
    fn s_memrealtime() -> u64;

    #[link_name = "llvm.amdgcn.s.sleep"]
    fn s_sleep(units: i32);
}

/// Publish the realtime counter frequency from device code.
pub fn set_clock_frequency(frequency_hz: u64) {
    TICKWAIT_CLOCK_FREQUENCY.store(frequency_hz, Ordering::Release);
}

/// AMDGPU clock and idle instruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmdgpuHardware;

impl FixedFrequencyClock for AmdgpuHardware {
    fn frequency_hz(&self) -> u64 {
        TICKWAIT_CLOCK_FREQUENCY.load(Ordering::Acquire)
    }

    #[inline]
    fn now(&self) -> TickCount {
        // SAFETY: reading the realtime counter has no side effects
        TickCount(unsafe { s_memrealtime() })
    }
}

impl WaitHardware for AmdgpuHardware {
    #[inline]
    fn idle(&self, hint: IdleHint) {
        // The operand must be an immediate.
        // SAFETY: `s_sleep` only idles the calling wave
        unsafe {
            match hint {
                IdleHint::WarmUp => s_sleep(WARM_UP_SLEEP),
                IdleHint::Poll => s_sleep(POLL_SLEEP),
            }
        }
    }
}
