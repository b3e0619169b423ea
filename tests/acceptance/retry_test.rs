//! Caller-side retry acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Re-requesting the remainder converges to at least the full request
//! - Hard capability limits and invalid arguments are never retried
//! - Exhausted retries surface the last remainder

use super::common::{Lcg, PollOnce};
use tickwait_runtime::{
    sleep_fully, NativeRetrySleep, SimulatedHardware, TimedWait, Timespec, Unsupported,
    WaitError, TICKS_PER_SEC,
};

#[test]
fn test_retry_converges() {
    let mut rng = Lcg::new(7);

    for _ in 0..100 {
        let advance = 1 + rng.below(500);
        let nanos = rng.below(1_000_000);
        let hw = SimulatedHardware::new(TICKS_PER_SEC).with_advance_per_read(advance);
        let sleeper = TimedWait::new(&hw, PollOnce);

        let report = sleep_fully(&sleeper, Timespec::from_nanos(nanos), u32::MAX).unwrap();

        assert!(report.elapsed_ns >= report.requested_ns);
        assert_eq!(report.requested_ns, nanos);
    }
}

#[test]
fn test_manual_retry_with_remainder() {
    // The same loop a POSIX caller would write around nanosleep.
    let hw = SimulatedHardware::new(TICKS_PER_SEC).with_advance_per_read(100);
    let sleeper = TimedWait::new(&hw, PollOnce);

    let mut req = Timespec::new(0, 1_000);
    let mut rem = Timespec::ZERO;
    let mut calls = 0;
    while sleeper.nanosleep(Some(&req), Some(&mut rem)) != 0 {
        req = rem;
        calls += 1;
        assert!(calls < 10, "remainder did not shrink");
    }

    // 200ns per call: 1000, 800, 600, 400, 200
    assert_eq!(calls, 4);
}

#[test]
fn test_native_needs_no_retry() {
    let hw = SimulatedHardware::new(TICKS_PER_SEC).with_native_sleep_percent(10);
    let sleeper = TimedWait::new(&hw, NativeRetrySleep);

    let report = sleep_fully(&sleeper, Timespec::new(0, 50_000), 4).unwrap();
    assert_eq!(report.attempts, 1);
    assert!(hw.native_sleeps() > 1);
}

#[test]
fn test_unsupported_is_not_retried() {
    let hw = SimulatedHardware::new(TICKS_PER_SEC);
    let sleeper = TimedWait::new(&hw, Unsupported);
    let req = Timespec::new(2, 0);

    let err = sleep_fully(&sleeper, req, 16).unwrap_err();

    assert_eq!(err, WaitError::Unsupported { remaining: req });
    assert_eq!(hw.clock_reads(), 1);
}

#[test]
fn test_exhausted_retries_report_remainder() {
    let hw = SimulatedHardware::new(TICKS_PER_SEC).with_advance_per_read(100);
    let sleeper = TimedWait::new(&hw, PollOnce);

    let err = sleep_fully(&sleeper, Timespec::new(0, 1_000), 3).unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.remaining(), Some(Timespec::new(0, 400)));
}
