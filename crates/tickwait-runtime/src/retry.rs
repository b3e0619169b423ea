//! Caller-side retry of short waits.
//!
//! The core never retries across calls; a caller that needs the full
//! duration re-requests whatever remainder it was handed back. This is that
//! loop, with a bound on the number of attempts.

use tickwait_common::{Timespec, WaitError};
use tracing::{debug, warn};

use crate::hardware::WaitHardware;
use crate::strategy::WaitStrategy;
use crate::wait::TimedWait;

/// Totals for a wait completed over one or more attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryReport {
    /// Number of calls into the timed wait, at least one.
    pub attempts: u32,
    /// Nanoseconds originally requested.
    pub requested_ns: u64,
    /// Tick-derived nanoseconds summed over every attempt.
    pub elapsed_ns: u64,
}

impl RetryReport {
    /// How far past the request the attempts ran in total.
    #[must_use]
    pub const fn overshoot_ns(&self) -> u64 {
        self.elapsed_ns.saturating_sub(self.requested_ns)
    }
}

/// Sleep for `requested`, re-invoking `sleeper` with the remainder after
/// each undershoot.
///
/// # Errors
///
/// Returns the first non-retryable error ([`WaitError::InvalidArgument`],
/// [`WaitError::Unsupported`]) unchanged, or the last
/// [`WaitError::Undershoot`] once `max_attempts` calls have been made.
pub fn sleep_fully<H, S>(
    sleeper: &TimedWait<H, S>,
    requested: Timespec,
    max_attempts: u32,
) -> Result<RetryReport, WaitError>
where
    H: WaitHardware,
    S: WaitStrategy,
{
    let requested_ns = requested.as_nanos_saturating();
    let max_attempts = max_attempts.max(1);
    let mut pending = requested;
    let mut elapsed_ns = 0u64;
    let mut attempt = 0;

    loop {
        attempt += 1;
        let mut remaining = Timespec::ZERO;
        match sleeper.wait(&pending, Some(&mut remaining)) {
            Ok(report) => {
                return Ok(RetryReport {
                    attempts: attempt,
                    requested_ns,
                    elapsed_ns: elapsed_ns.saturating_add(report.elapsed_ns),
                });
            }
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let slept = pending
                    .as_nanos_saturating()
                    .saturating_sub(remaining.as_nanos_saturating());
                elapsed_ns = elapsed_ns.saturating_add(slept);
                debug!(attempt, %remaining, "Timed wait ended early, retrying");
                pending = remaining;
            }
            Err(err) => {
                if err.is_retryable() {
                    warn!(attempts = attempt, %requested, error = %err, "Retries exhausted");
                }
                return Err(err);
            }
        }
    }
}
