//! Names for the timed-wait strategies.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three ways a target can implement a timed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Native sleep instruction with a loosely bounded delay, re-issued
    /// with a shrinking budget until the target tick is reached.
    #[default]
    Native,
    /// Fixed-size idle instruction polled until the target tick is reached.
    Coarse,
    /// No wait primitive; the request is returned unslept.
    Unsupported,
}

impl StrategyKind {
    /// All strategies, in declaration order.
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Native,
        StrategyKind::Coarse,
        StrategyKind::Unsupported,
    ];

    /// Lowercase name, as used in configuration files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Native => "native",
            StrategyKind::Coarse => "coarse",
            StrategyKind::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown wait strategy (expected native, coarse or unsupported)")]
pub struct ParseStrategyKindError;

impl FromStr for StrategyKind {
    type Err = ParseStrategyKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or(ParseStrategyKindError)
    }
}
