//! Common utilities for integration tests.
//!
//! Provides helpers for:
//! - Strategies that stop early on purpose
//! - Deterministic pseudo-random sweeps
//! - Checking wait outcomes

#![allow(dead_code)]

use tickwait_runtime::{
    StrategyKind, WaitHardware, WaitProgress, WaitReport, WaitStrategy, WaitTarget,
};

/// Frequencies with an exact nanosecond tick length, from 1 GHz down to 1 MHz.
pub const FREQUENCIES: [u64; 5] = [1_000_000_000, 250_000_000, 100_000_000, 25_000_000, 1_000_000];

/// Reads the clock once and returns without checking the target, like a
/// wait loop cut short by the scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollOnce;

impl WaitStrategy for PollOnce {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Native
    }

    fn wait<H: WaitHardware + ?Sized>(&self, hw: &H, _target: &WaitTarget) -> WaitProgress {
        WaitProgress::Reached(hw.now())
    }
}

/// Small deterministic generator so sweeps are reproducible.
#[derive(Debug, Clone)]
pub struct Lcg(u64);

impl Lcg {
    /// Create a generator from `seed`.
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Next value in `[0, bound)`.
    pub fn below(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) % bound.max(1)
    }
}

/// Assert that a successful wait covered its request.
pub fn assert_covers(report: &WaitReport) {
    assert!(
        report.elapsed_ns >= report.requested_ns,
        "success with elapsed {}ns < requested {}ns",
        report.elapsed_ns,
        report.requested_ns
    );
}
