//! Error taxonomy for timed waits.
//!
//! Callers see two kinds of failure: arguments rejected before any waiting,
//! and waits that did not cover the full request.

use thiserror::Error;

use crate::time::Timespec;

/// Status returned by the POSIX-style entry points when the full duration elapsed.
pub const STATUS_OK: i32 = 0;

/// Status returned by the POSIX-style entry points for every failure.
pub const STATUS_INCOMPLETE: i32 = -1;

/// Why a timed wait refused to start.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    /// No duration was supplied (the null `req` pointer).
    #[error("no duration supplied")]
    MissingDuration,

    /// The clock frequency is zero or has not been published yet.
    #[error("clock frequency is unknown")]
    UnknownFrequency,

    /// The clock ticks faster than once per nanosecond.
    #[error("clock frequency {frequency_hz}Hz exceeds nanosecond resolution")]
    FrequencyTooHigh {
        /// Reported frequency in Hz.
        frequency_hz: u64,
    },
}

/// Timed-wait failures.
///
/// Every variant maps onto the two-valued POSIX status (`-1`); the
/// remainder carried by [`WaitError::Undershoot`] and
/// [`WaitError::Unsupported`] is the same value written to the caller's
/// output duration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// Detected before any waiting began; nothing was written.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),

    /// The wait returned before the requested duration elapsed.
    #[error("wait ended early, {remaining} left")]
    Undershoot {
        /// Unslept part of the request.
        remaining: Timespec,
    },

    /// The target has no wait primitive; nothing was slept.
    #[error("timed wait not supported on this target, {remaining} left")]
    Unsupported {
        /// The full original request.
        remaining: Timespec,
    },
}

/// The two-kind error taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before waiting; no guarantee of any sleep.
    InvalidArgument,
    /// The wait did not cover the full request.
    Incomplete,
}

impl WaitError {
    /// Collapse into the two-kind taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            WaitError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            WaitError::Undershoot { .. } | WaitError::Unsupported { .. } => ErrorKind::Incomplete,
        }
    }

    /// Unslept remainder, if the wait got far enough to compute one.
    #[must_use]
    pub const fn remaining(&self) -> Option<Timespec> {
        match self {
            WaitError::InvalidArgument(_) => None,
            WaitError::Undershoot { remaining } | WaitError::Unsupported { remaining } => {
                Some(*remaining)
            }
        }
    }

    /// Whether re-invoking with the remainder can make progress.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, WaitError::Undershoot { .. })
    }

    /// POSIX status for this failure.
    #[must_use]
    pub const fn status(&self) -> i32 {
        STATUS_INCOMPLETE
    }
}

/// Convenience type alias for timed-wait operations.
pub type WaitResult<T> = Result<T, WaitError>;
