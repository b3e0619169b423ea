//! Workload report for the `tickwait` CLI.
//!
//! Collects the merged wait metrics of every sleeper thread and renders
//! them as plain text or JSON.

use serde::Serialize;
use std::time::Duration;
use tickwait_common::metrics::{WaitMetrics, WaitMetricsSnapshot};
use tickwait_common::StrategyKind;

/// One overshoot percentile.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PercentileEntry {
    /// Percentile in `[0, 100]`.
    pub percentile: f64,
    /// Overshoot at that percentile in nanoseconds.
    pub overshoot_ns: u64,
}

/// Summary of a completed workload.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReport {
    /// Strategy the emulated hardware was driven with.
    pub strategy: StrategyKind,
    /// Emulated clock frequency in Hz.
    pub frequency_hz: u64,
    /// Nanoseconds per emulated tick.
    pub tick_rate_ns: u64,
    /// Duration requested by every wait, in nanoseconds.
    pub requested_ns: u64,
    /// Sleeper threads.
    pub threads: usize,
    /// Waits per thread.
    pub iterations: u64,
    /// Calls into the timed wait, counting retries.
    pub attempts: u64,
    /// Wall-clock time of the whole workload in nanoseconds.
    pub wall_time_ns: u64,
    /// Merged outcome counters and overshoot statistics.
    pub metrics: WaitMetricsSnapshot,
    /// Requested overshoot percentiles; empty when metrics are disabled.
    pub percentiles: Vec<PercentileEntry>,
}

impl WorkloadReport {
    /// Fill in the metric-derived fields from merged `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: &WaitMetrics, percentiles: &[f64]) -> Self {
        self.metrics = metrics.snapshot();
        self.percentiles = metrics
            .percentiles(percentiles)
            .into_iter()
            .map(|(percentile, overshoot)| PercentileEntry {
                percentile,
                overshoot_ns: u64::try_from(overshoot.as_nanos()).unwrap_or(u64::MAX),
            })
            .collect();
        self
    }

    /// Waits that did not cover the full request.
    #[must_use]
    pub fn incomplete(&self) -> u64 {
        self.metrics.undershoots + self.metrics.unsupported
    }

    /// Whether every wait covered its request.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.incomplete() == 0
    }
}

fn format_ns(ns: u64) -> String {
    humantime::format_duration(Duration::from_nanos(ns)).to_string()
}

fn format_opt_ns(ns: Option<u64>) -> String {
    ns.map_or_else(|| "-".to_string(), format_ns)
}

/// Render the report as human-readable text.
pub fn format_text(report: &WorkloadReport) -> String {
    let mut output = String::new();
    let m = &report.metrics;

    output.push_str(&format!(
        "strategy:    {} @ {} Hz ({} ns/tick)\n",
        report.strategy, report.frequency_hz, report.tick_rate_ns
    ));
    output.push_str(&format!(
        "workload:    {} x {} waits of {}\n",
        report.threads,
        report.iterations,
        format_ns(report.requested_ns)
    ));
    output.push_str(&format!(
        "outcomes:    {} complete, {} undershoot, {} unsupported ({} attempts)\n",
        m.completed, m.undershoots, m.unsupported, report.attempts
    ));
    output.push_str(&format!(
        "overshoot:   min {} / mean {} / max {}\n",
        format_opt_ns(m.min_overshoot_ns),
        format_opt_ns(m.mean_overshoot_ns),
        format_opt_ns(m.max_overshoot_ns)
    ));
    if let Some(jitter) = m.jitter_ns() {
        output.push_str(&format!("jitter:      {}\n", format_ns(jitter)));
    }
    for entry in &report.percentiles {
        output.push_str(&format!(
            "p{:<10} {}\n",
            entry.percentile,
            format_ns(entry.overshoot_ns)
        ));
    }
    if m.total_shortfall_ns > 0 {
        output.push_str(&format!(
            "shortfall:   {} unslept in total\n",
            format_ns(m.total_shortfall_ns)
        ));
    }
    output.push_str(&format!(
        "wall time:   {}\n",
        format_ns(report.wall_time_ns)
    ));

    output
}

/// Render the report as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn format_json(report: &WorkloadReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
