//! Concurrent sleeper acceptance tests.
//!
//! Each thread manages its own wait; the only thing shared is the clock.
//!
//! # Acceptance Criteria
//!
//! - Every sleeper covers its own request regardless of the others
//! - One `TimedWait` can be shared by reference across threads

use super::common::assert_covers;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tickwait_runtime::{
    EmulatedHardware, NativeRetrySleep, SimulatedHardware, StrategyKind, TimedWait, Timespec,
    TICKS_PER_SEC,
};

#[test]
fn test_shared_simulated_clock() {
    let hw = Arc::new(
        SimulatedHardware::new(TICKS_PER_SEC)
            .with_native_sleep_percent(30)
            .with_advance_per_read(3),
    );

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let hw = Arc::clone(&hw);
            std::thread::spawn(move || {
                let sleeper = TimedWait::new(&*hw, NativeRetrySleep);
                for n in 0..200 {
                    let req = Timespec::from_nanos(100 + i * 37 + n);
                    let report = sleeper.wait(&req, None).unwrap();
                    assert_covers(&report);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(hw.native_sleeps() > 0);
}

#[test]
fn test_one_sleeper_many_threads() {
    let hw = SimulatedHardware::new(100_000_000).with_idle_ticks(1, 4);
    let sleeper = TimedWait::new(&hw, StrategyKind::Coarse);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    let report = sleeper.wait(&Timespec::new(0, 5_000), None).unwrap();
                    assert_covers(&report);
                }
            });
        }
    });

    assert!(hw.poll_idles() > 0);
}

#[test]
fn test_emulated_hardware_sleeps_on_host() {
    // 100 MHz emulated clock, native sleep undershooting by half
    let hw = EmulatedHardware::new(100_000_000).with_native_sleep_ratio(0.5);
    let requested = Duration::from_micros(200);

    std::thread::scope(|scope| {
        for kind in [StrategyKind::Native, StrategyKind::Coarse] {
            let hw = &hw;
            scope.spawn(move || {
                let sleeper = TimedWait::new(hw, kind);
                let started = Instant::now();
                let report = sleeper.wait(&Timespec::from(requested), None).unwrap();
                let wall = started.elapsed();

                assert_covers(&report);
                // One emulated tick of slack for the truncating clock scale.
                assert!(wall + Duration::from_nanos(10) >= requested, "{kind}: {wall:?}");
            });
        }
    });
}
