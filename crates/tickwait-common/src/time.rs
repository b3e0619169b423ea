//! Durations, tick counts, and clock-rate conversion.
//!
//! All arithmetic here is unsigned 64-bit and saturating: a requested
//! duration too large to express in nanoseconds clamps to `u64::MAX`
//! (roughly 584 years), and a clock reading that appears to run backwards
//! yields zero elapsed ticks.

use core::fmt;
use core::num::NonZeroU64;
use core::time::Duration;

use static_assertions::const_assert;

use crate::error::InvalidArgument;

/// Nanoseconds per second; the conversion constant between a [`Timespec`]
/// and the tick domain.
pub const TICKS_PER_SEC: u64 = 1_000_000_000;

const_assert!(TICKS_PER_SEC > 0);

/// A POSIX-style `(seconds, nanoseconds)` duration.
///
/// `nanos` is expected to be below one second but this is not enforced;
/// an out-of-range value is folded into the total by
/// [`Timespec::as_nanos_saturating`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Timespec {
    /// Whole seconds.
    pub secs: u64,
    /// Additional nanoseconds.
    pub nanos: u64,
}

impl Timespec {
    /// The zero duration.
    pub const ZERO: Timespec = Timespec { secs: 0, nanos: 0 };

    /// Create a duration from seconds and nanoseconds, stored as given.
    #[must_use]
    pub const fn new(secs: u64, nanos: u64) -> Self {
        Self { secs, nanos }
    }

    /// Split a nanosecond count into seconds and sub-second nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self {
            secs: nanos / TICKS_PER_SEC,
            nanos: nanos % TICKS_PER_SEC,
        }
    }

    /// Total nanoseconds, `nanos + secs * TICKS_PER_SEC`, clamped to `u64::MAX`.
    #[must_use]
    pub const fn as_nanos_saturating(&self) -> u64 {
        self.secs
            .saturating_mul(TICKS_PER_SEC)
            .saturating_add(self.nanos)
    }

    /// Convert to a [`Duration`], or `None` if the total overflows it.
    #[must_use]
    pub fn to_duration(&self) -> Option<Duration> {
        Duration::from_secs(self.secs).checked_add(Duration::from_nanos(self.nanos))
    }
}

impl From<Duration> for Timespec {
    fn from(duration: Duration) -> Self {
        Self {
            secs: duration.as_secs(),
            nanos: u64::from(duration.subsec_nanos()),
        }
    }
}

impl fmt::Display for Timespec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos < TICKS_PER_SEC {
            write!(f, "{}.{:09}s", self.secs, self.nanos)
        } else {
            write!(f, "{}s+{}ns", self.secs, self.nanos)
        }
    }
}

/// A raw reading of the fixed-frequency hardware clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickCount(pub u64);

impl TickCount {
    /// Ticks elapsed since `earlier`, or zero if the clock appears to have
    /// gone backwards.
    #[must_use]
    pub const fn saturating_ticks_since(self, earlier: TickCount) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// The tick `ticks` after this one, clamped at the counter's maximum.
    #[must_use]
    pub const fn saturating_add(self, ticks: u64) -> TickCount {
        TickCount(self.0.saturating_add(ticks))
    }
}

impl fmt::Display for TickCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frequency of the fixed-frequency clock and its derived tick length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockRate {
    frequency_hz: NonZeroU64,
    tick_rate: NonZeroU64,
}

impl ClockRate {
    /// Validate a clock frequency.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument::UnknownFrequency`] for a zero frequency and
    /// [`InvalidArgument::FrequencyTooHigh`] when one tick would be shorter
    /// than a nanosecond.
    pub const fn new(frequency_hz: u64) -> Result<Self, InvalidArgument> {
        let Some(frequency) = NonZeroU64::new(frequency_hz) else {
            return Err(InvalidArgument::UnknownFrequency);
        };
        match NonZeroU64::new(TICKS_PER_SEC / frequency_hz) {
            Some(tick_rate) => Ok(Self {
                frequency_hz: frequency,
                tick_rate,
            }),
            None => Err(InvalidArgument::FrequencyTooHigh { frequency_hz }),
        }
    }

    /// Clock frequency in Hz.
    #[must_use]
    pub const fn frequency_hz(&self) -> u64 {
        self.frequency_hz.get()
    }

    /// Nanoseconds represented by one tick.
    #[must_use]
    pub const fn tick_rate(&self) -> u64 {
        self.tick_rate.get()
    }

    /// Smallest tick count covering `nanos`, i.e. `ceil(nanos / tick_rate)`.
    #[must_use]
    pub const fn ticks_for_nanos(&self, nanos: u64) -> u64 {
        nanos.div_ceil(self.tick_rate.get())
    }

    /// Nanoseconds covered by `ticks`, clamped to `u64::MAX`.
    #[must_use]
    pub const fn nanos_for_ticks(&self, ticks: u64) -> u64 {
        ticks.saturating_mul(self.tick_rate.get())
    }
}
