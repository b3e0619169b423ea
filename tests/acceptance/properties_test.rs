//! Outcome properties of a single timed wait.
//!
//! # Acceptance Criteria
//!
//! - Success only when tick-derived elapsed time covers the request
//! - An incomplete wait's remainder matches the shortfall within one tick
//! - Unsupported targets hand back the request unchanged
//! - Rejected arguments leave the remainder untouched

use super::common::{assert_covers, Lcg, PollOnce, FREQUENCIES};
use tickwait_runtime::{
    ClockRate, CoarsePollingSleep, ErrorKind, InvalidArgument, NativeRetrySleep,
    SimulatedHardware, StrategyKind, TimedWait, Timespec, Unsupported, WaitError,
    TICKS_PER_SEC,
};

#[test]
fn test_never_undershoots_silently() {
    let mut rng = Lcg::new(0x5eed);

    for &frequency in &FREQUENCIES {
        for _ in 0..50 {
            let percent = rng.below(201);
            let advance = 1 + rng.below(50);
            let nanos = rng.below(200_000);

            let hw = SimulatedHardware::new(frequency)
                .with_native_sleep_percent(percent)
                .with_advance_per_read(advance)
                .with_idle_ticks(rng.below(4), 1 + rng.below(20));

            for kind in [StrategyKind::Native, StrategyKind::Coarse] {
                let sleeper = TimedWait::new(&hw, kind);
                match sleeper.wait(&Timespec::from_nanos(nanos), None) {
                    Ok(report) => assert_covers(&report),
                    Err(err) => panic!("{kind} wait at {frequency}Hz failed: {err}"),
                }
            }
        }
    }
}

#[test]
fn test_remainder_within_one_tick() {
    let mut rng = Lcg::new(42);

    for &frequency in &FREQUENCIES {
        let tick_rate = ClockRate::new(frequency).unwrap().tick_rate();

        for _ in 0..50 {
            let advance = 1 + rng.below(100);
            let nanos = rng.below(10_000_000);
            let hw = SimulatedHardware::new(frequency).with_advance_per_read(advance);
            let sleeper = TimedWait::new(&hw, PollOnce);
            let mut rem = Timespec::ZERO;

            // Start and stop are two reads apart.
            let elapsed_ns = 2 * advance * tick_rate;

            match sleeper.wait(&Timespec::from_nanos(nanos), Some(&mut rem)) {
                Ok(report) => {
                    assert_covers(&report);
                    assert!(nanos <= elapsed_ns);
                }
                Err(err) => {
                    assert_eq!(err.kind(), ErrorKind::Incomplete);
                    assert_eq!(err.remaining(), Some(rem));
                    let shortfall = nanos - elapsed_ns;
                    assert!(rem.as_nanos_saturating().abs_diff(shortfall) < tick_rate);
                }
            }
        }
    }
}

#[test]
fn test_zero_duration_succeeds_immediately() {
    for &frequency in &FREQUENCIES {
        let hw = SimulatedHardware::new(frequency);
        let mut rem = Timespec::new(1, 1);

        let native = TimedWait::new(&hw, NativeRetrySleep);
        let coarse = TimedWait::new(&hw, CoarsePollingSleep);

        assert_eq!(native.nanosleep(Some(&Timespec::ZERO), Some(&mut rem)), 0);
        assert_eq!(coarse.nanosleep(Some(&Timespec::ZERO), Some(&mut rem)), 0);
        assert_eq!(rem, Timespec::new(1, 1));
        assert_eq!(hw.native_sleeps(), 0);
    }
}

#[test]
fn test_native_scenarios() {
    // tick_rate 1: clock jumps by 1500 on the first poll
    let hw = SimulatedHardware::new(TICKS_PER_SEC).with_script([0, 0, 1_500]);
    let sleeper = TimedWait::new(&hw, NativeRetrySleep);
    assert_eq!(sleeper.nanosleep(Some(&Timespec::new(0, 1_000)), None), 0);

    // Only 500 ticks pass before the loop gives up
    let hw = SimulatedHardware::new(TICKS_PER_SEC).with_script([0, 500]);
    let sleeper = TimedWait::new(&hw, PollOnce);
    let mut rem = Timespec::ZERO;
    assert_eq!(
        sleeper.nanosleep(Some(&Timespec::new(0, 1_000)), Some(&mut rem)),
        -1
    );
    assert_eq!(rem, Timespec::new(0, 500));
}

#[test]
fn test_unsupported_returns_full_request() {
    let hw = SimulatedHardware::new(TICKS_PER_SEC).with_advance_per_read(1_000);
    let sleeper = TimedWait::new(&hw, Unsupported);

    for req in [
        Timespec::ZERO,
        Timespec::new(0, 1),
        Timespec::new(5, 999_999_999),
        Timespec::new(u64::MAX, u64::MAX),
    ] {
        let mut rem = Timespec::new(123, 456);
        let err = sleeper.wait(&req, Some(&mut rem)).unwrap_err();
        assert_eq!(rem, req);
        assert_eq!(err, WaitError::Unsupported { remaining: req });
        assert_eq!(err.status(), -1);
    }
    assert_eq!(hw.native_sleeps(), 0);
}

#[test]
fn test_invalid_arguments_leave_remainder() {
    let untouched = Timespec::new(9, 9);

    let hw = SimulatedHardware::new(TICKS_PER_SEC);
    let sleeper = TimedWait::new(&hw, NativeRetrySleep);
    let mut rem = untouched;
    assert_eq!(sleeper.nanosleep(None, Some(&mut rem)), -1);
    assert_eq!(rem, untouched);

    for (frequency, expected) in [
        (0, InvalidArgument::UnknownFrequency),
        (
            3_000_000_000,
            InvalidArgument::FrequencyTooHigh {
                frequency_hz: 3_000_000_000,
            },
        ),
    ] {
        let hw = SimulatedHardware::new(frequency);
        let sleeper = TimedWait::new(&hw, CoarsePollingSleep);
        let mut rem = untouched;

        let err = sleeper
            .wait(&Timespec::new(0, 100), Some(&mut rem))
            .unwrap_err();

        assert_eq!(err, WaitError::InvalidArgument(expected));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(rem, untouched);
        assert_eq!(hw.clock_reads(), 0);
    }
}

#[test]
fn test_huge_request_saturates() {
    // A request past u64 nanoseconds clamps instead of wrapping into a
    // short wait.
    let hw = SimulatedHardware::new(TICKS_PER_SEC).with_script([0, 10]);
    let sleeper = TimedWait::new(&hw, PollOnce);
    let mut rem = Timespec::ZERO;

    assert!(sleeper
        .wait(&Timespec::new(u64::MAX, 0), Some(&mut rem))
        .is_err());
    assert_eq!(rem, Timespec::from_nanos(u64::MAX - 10));
}

#[test]
fn test_capability_gate_degrades_to_polling() {
    let hw = SimulatedHardware::new(TICKS_PER_SEC)
        .with_native_sleep(false)
        .with_advance_per_read(250);
    let sleeper = TimedWait::new(&hw, NativeRetrySleep);

    let report = sleeper.wait(&Timespec::new(0, 10_000), None).unwrap();
    assert_covers(&report);
    assert_eq!(hw.native_sleeps(), 0);
}
