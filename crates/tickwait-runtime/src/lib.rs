#![doc = "Best-effort timed wait for accelerator cores without an OS scheduler."]
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(
    any(target_arch = "nvptx64", target_arch = "amdgpu"),
    feature(link_llvm_intrinsics)
)]

pub mod hardware;
pub mod strategy;
pub mod wait;

#[cfg(feature = "ffi")]
pub mod ffi;
#[cfg(feature = "std")]
pub mod retry;
#[cfg(feature = "std")]
pub mod sim;

pub use hardware::*;
#[cfg(feature = "std")]
pub use retry::*;
#[cfg(feature = "std")]
pub use sim::SimulatedHardware;
pub use strategy::*;
pub use wait::*;

pub use tickwait_common::{
    ClockRate, ErrorKind, InvalidArgument, StrategyKind, TickCount, Timespec, WaitError,
    WaitResult, TICKS_PER_SEC,
};
