//! Wait outcome metrics.
//!
//! Tracks how far completed waits overshot their request, with a ring
//! buffer for percentiles that is allocated once up front.

use std::time::Duration;

/// Outcome metrics for a series of timed waits.
#[derive(Debug, Clone)]
pub struct WaitMetrics {
    /// Ring buffer of overshoot values in nanoseconds.
    samples: Box<[u64]>,
    /// Current write position in the ring buffer.
    write_pos: usize,
    /// Number of samples collected (saturates at buffer size).
    sample_count: usize,
    /// Waits that covered the full request.
    completed: u64,
    /// Waits that returned early with a remainder.
    undershoots: u64,
    /// Waits refused because the target has no wait primitive.
    unsupported: u64,
    /// Minimum observed overshoot in nanoseconds.
    min_ns: u64,
    /// Maximum observed overshoot in nanoseconds.
    max_ns: u64,
    /// Sum of overshoots for mean calculation.
    sum_ns: u64,
    /// Sum of reported remainders in nanoseconds.
    shortfall_ns: u64,
}

impl WaitMetrics {
    /// Create a new metrics collector with the given histogram size.
    #[must_use]
    pub fn new(histogram_size: usize) -> Self {
        let size = histogram_size.max(1);
        Self {
            samples: vec![0u64; size].into_boxed_slice(),
            write_pos: 0,
            sample_count: 0,
            completed: 0,
            undershoots: 0,
            unsupported: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            sum_ns: 0,
            shortfall_ns: 0,
        }
    }

    /// Record a wait that covered its request, with the measured overshoot.
    pub fn record_complete(&mut self, overshoot_ns: u64) {
        self.samples[self.write_pos] = overshoot_ns;
        self.write_pos = (self.write_pos + 1) % self.samples.len();
        self.sample_count = self.sample_count.saturating_add(1).min(self.samples.len());

        self.completed += 1;
        self.min_ns = self.min_ns.min(overshoot_ns);
        self.max_ns = self.max_ns.max(overshoot_ns);
        self.sum_ns = self.sum_ns.saturating_add(overshoot_ns);
    }

    /// Record a wait that returned early with `remaining_ns` unslept.
    pub fn record_undershoot(&mut self, remaining_ns: u64) {
        self.undershoots += 1;
        self.shortfall_ns = self.shortfall_ns.saturating_add(remaining_ns);
    }

    /// Record a wait refused by a target without a wait primitive.
    pub fn record_unsupported(&mut self) {
        self.unsupported += 1;
    }

    /// Total waits recorded.
    #[must_use]
    pub fn total_waits(&self) -> u64 {
        self.completed + self.undershoots + self.unsupported
    }

    /// Waits that covered the full request.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Waits that did not cover the full request, for any reason.
    #[must_use]
    pub fn incomplete(&self) -> u64 {
        self.undershoots + self.unsupported
    }

    /// Compute multiple percentiles over one sorted copy of the samples.
    ///
    /// Invalid percentiles (< 0, > 100, or NaN) are skipped.
    #[must_use]
    pub fn percentiles(&self, percentiles: &[f64]) -> Vec<(f64, Duration)> {
        if self.sample_count == 0 {
            return vec![];
        }

        let mut sorted: Vec<u64> = self.samples[..self.sample_count].to_vec();
        sorted.sort_unstable();

        percentiles
            .iter()
            .filter(|&&p| (0.0..=100.0).contains(&p))
            .map(|&p| {
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
                let idx = idx.min(sorted.len() - 1);
                (p, Duration::from_nanos(sorted[idx]))
            })
            .collect()
    }

    /// Fold another collector into this one, e.g. one per sleeper thread.
    pub fn merge(&mut self, other: &WaitMetrics) {
        let start = if other.sample_count < other.samples.len() {
            0
        } else {
            other.write_pos
        };
        for i in 0..other.sample_count {
            let ns = other.samples[(start + i) % other.samples.len()];
            self.samples[self.write_pos] = ns;
            self.write_pos = (self.write_pos + 1) % self.samples.len();
            self.sample_count = self.sample_count.saturating_add(1).min(self.samples.len());
        }

        self.completed += other.completed;
        self.undershoots += other.undershoots;
        self.unsupported += other.unsupported;
        if other.completed > 0 {
            self.min_ns = self.min_ns.min(other.min_ns);
            self.max_ns = self.max_ns.max(other.max_ns);
        }
        self.sum_ns = self.sum_ns.saturating_add(other.sum_ns);
        self.shortfall_ns = self.shortfall_ns.saturating_add(other.shortfall_ns);
    }

    /// Get a snapshot of current metrics.
    #[must_use]
    pub fn snapshot(&self) -> WaitMetricsSnapshot {
        let any = self.completed > 0;
        WaitMetricsSnapshot {
            total_waits: self.total_waits(),
            completed: self.completed,
            undershoots: self.undershoots,
            unsupported: self.unsupported,
            min_overshoot_ns: any.then_some(self.min_ns),
            max_overshoot_ns: any.then_some(self.max_ns),
            mean_overshoot_ns: any.then(|| self.sum_ns / self.completed),
            total_shortfall_ns: self.shortfall_ns,
            sample_count: self.sample_count,
        }
    }
}

/// Immutable snapshot of metrics for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct WaitMetricsSnapshot {
    /// Total waits recorded.
    pub total_waits: u64,
    /// Waits that covered the full request.
    pub completed: u64,
    /// Waits that returned early.
    pub undershoots: u64,
    /// Waits refused for lack of a wait primitive.
    pub unsupported: u64,
    /// Minimum overshoot in nanoseconds.
    pub min_overshoot_ns: Option<u64>,
    /// Maximum overshoot in nanoseconds.
    pub max_overshoot_ns: Option<u64>,
    /// Mean overshoot in nanoseconds.
    pub mean_overshoot_ns: Option<u64>,
    /// Sum of all reported remainders in nanoseconds.
    pub total_shortfall_ns: u64,
    /// Number of samples in the histogram.
    pub sample_count: usize,
}

impl WaitMetricsSnapshot {
    /// Spread of overshoot (max - min) in nanoseconds.
    #[must_use]
    pub fn jitter_ns(&self) -> Option<u64> {
        match (self.min_overshoot_ns, self.max_overshoot_ns) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        }
    }
}
