//! NVPTX bindings.
//!
//! The clock is the `%globaltimer` special register, a nanosecond counter.
//! `nanosleep.u32` only exists from `sm_70` on; older targets keep the
//! instruction compiled out and poll instead.

use tickwait_common::TickCount;

use super::{FixedFrequencyClock, WaitHardware};

/// `%globaltimer` counts nanoseconds.
pub const GLOBALTIMER_FREQUENCY_HZ: u64 = 1_000_000_000;

#[allow(improper_ctypes)]
extern "C" {
    #[link_name = "llvm.nvvm.read.ptx.sreg.globaltimer"]
    fn read_globaltimer() -> u64;

    #[cfg(target_feature = "sm_70")]
    #[link_name = "llvm.nvvm.nanosleep"]
    fn nanosleep(nanos: u32);
}

/// NVPTX clock and sleep instruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NvptxHardware;

impl FixedFrequencyClock for NvptxHardware {
    fn frequency_hz(&self) -> u64 {
        GLOBALTIMER_FREQUENCY_HZ
    }

    #[inline]
    fn now(&self) -> TickCount {
        // SAFETY: reading a special register has no side effects
        #[allow(unsafe_code)]
        let ticks = unsafe { read_globaltimer() };
        TickCount(ticks)
    }
}

impl WaitHardware for NvptxHardware {
    fn native_sleep_available(&self) -> bool {
        cfg!(target_feature = "sm_70")
    }

    #[inline]
    fn native_sleep(&self, nanos: u32) {
        #[cfg(target_feature = "sm_70")]
        // SAFETY: `nanosleep.u32` suspends the calling thread only
        #[allow(unsafe_code)]
        unsafe {
            nanosleep(nanos);
        }
        #[cfg(not(target_feature = "sm_70"))]
        let _ = nanos;
    }
}
