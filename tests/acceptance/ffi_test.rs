//! C entry point acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - A null request fails with `-1` and leaves the remainder alone
//! - A null remainder is accepted and discarded
//! - On a host build the full request comes back as the remainder

use std::ptr;
use tickwait_runtime::ffi::tickwait_nanosleep;
use tickwait_runtime::Timespec;

#[test]
fn test_null_request_rejected() {
    let mut rem = Timespec::new(4, 4);

    // SAFETY: null req, rem is a valid local
    let status = unsafe { tickwait_nanosleep(ptr::null(), &mut rem) };

    assert_eq!(status, -1);
    assert_eq!(rem, Timespec::new(4, 4));
}

#[test]
fn test_host_build_hands_back_request() {
    let req = Timespec::new(1, 250);
    let mut rem = Timespec::ZERO;

    // SAFETY: both pointers are valid, non-overlapping locals
    let status = unsafe { tickwait_nanosleep(&req, &mut rem) };
    assert_eq!(status, -1);
    assert_eq!(rem, req);

    // SAFETY: valid req, null rem
    let status = unsafe { tickwait_nanosleep(&req, ptr::null_mut()) };
    assert_eq!(status, -1);
}
