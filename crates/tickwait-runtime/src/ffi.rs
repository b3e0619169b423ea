//! C ABI entry point.
//!
//! Exposes the build target's timed wait as `tickwait_nanosleep`, with the
//! same contract as POSIX `nanosleep`: a null `req` fails with `-1`, a null
//! `rem` discards the remainder.

use core::ffi::c_int;

use static_assertions::{assert_eq_align, assert_eq_size};
use tickwait_common::Timespec;

use crate::wait::nanosleep;

// The C side declares `struct { uint64_t secs; uint64_t nanos; }`.
assert_eq_size!(Timespec, [u64; 2]);
assert_eq_align!(Timespec, u64);

/// Sleep for at least `*req`.
///
/// Returns `0` when the full duration elapsed. Otherwise returns `-1` and,
/// if `rem` is non-null and the wait got far enough to measure one, writes
/// the unslept remainder to `*rem`.
///
/// # Safety
///
/// `req` must be null or point to a readable `Timespec`. `rem` must be null
/// or point to a writable `Timespec` that does not overlap `*req`.
#[no_mangle]
pub unsafe extern "C" fn tickwait_nanosleep(req: *const Timespec, rem: *mut Timespec) -> c_int {
    // SAFETY: the caller guarantees both pointers are null or valid and
    // non-overlapping
    let (req, rem) = unsafe { (req.as_ref(), rem.as_mut()) };
    nanosleep(req, rem)
}
