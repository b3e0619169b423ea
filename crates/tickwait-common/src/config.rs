//! Configuration structures for host emulation and the `tickwait` CLI.
//!
//! Supports TOML deserialization with sensible defaults. Target builds never
//! read configuration; the clock frequency and strategy there come from the
//! hardware itself.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::strategy::StrategyKind;
use crate::time::ClockRate;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TickwaitConfig {
    /// Emulated fixed-frequency clock.
    pub clock: ClockConfig,

    /// Emulated wait instructions.
    pub emulation: EmulationConfig,

    /// Caller-side retry policy.
    pub retry: RetryConfig,

    /// Sleep workload run by the CLI.
    pub workload: WorkloadConfig,

    /// Metrics collection.
    pub metrics: MetricsConfig,
}

/// Fixed-frequency clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Clock frequency in Hz. Must divide into whole nanoseconds per tick
    /// to be exact; the tick length is truncated otherwise.
    pub frequency_hz: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 100_000_000, // 100 MHz, 10ns per tick
        }
    }
}

/// Emulated wait-instruction behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulationConfig {
    /// Strategy to drive the emulated hardware with.
    pub strategy: StrategyKind,

    /// Whether the native sleep instruction passes its capability gate.
    /// When false the native strategy degrades to pure polling.
    pub native_sleep: bool,

    /// Fraction of the requested time the native sleep actually waits,
    /// in `[0, 2]`.
    pub native_sleep_ratio: f64,

    /// Spin iterations of the short warm-up idle.
    pub warm_up_spins: u32,

    /// Spin iterations of the polling idle.
    pub poll_spins: u32,
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Native,
            native_sleep: true,
            native_sleep_ratio: 0.5,
            warm_up_spins: 128,
            poll_spins: 960,
        }
    }
}

/// Caller-side retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Re-request the remainder after an undershoot.
    pub enabled: bool,

    /// Maximum attempts per wait, including the first.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 8,
        }
    }
}

/// Sleep workload run by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// Duration requested by every wait.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Waits per thread.
    pub iterations: u64,

    /// Independent sleeper threads.
    pub threads: usize,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_micros(100),
            iterations: 100,
            threads: 1,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics collection.
    pub enabled: bool,

    /// Size of the overshoot histogram ring buffer.
    pub histogram_size: usize,

    /// Percentiles to report (e.g., [50, 90, 99]).
    pub percentiles: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_size: 10_000,
            percentiles: vec![50.0, 90.0, 99.0, 99.9],
        }
    }
}

impl TickwaitConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ClockRate::new(self.clock.frequency_hz)
            .map_err(|e| ConfigError::Invalid(format!("clock.frequency_hz: {e}")))?;

        let ratio = self.emulation.native_sleep_ratio;
        if !(0.0..=2.0).contains(&ratio) {
            return Err(ConfigError::Invalid(format!(
                "emulation.native_sleep_ratio must be within [0, 2], got {ratio}"
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.workload.threads == 0 {
            return Err(ConfigError::Invalid(
                "workload.threads must be at least 1".into(),
            ));
        }
        if self.metrics.histogram_size == 0 {
            return Err(ConfigError::Invalid(
                "metrics.histogram_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Environment variable naming a configuration file.
pub const CONFIG_PATH_ENV: &str = "TICKWAIT_CONFIG_PATH";

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tickwait/config.toml";

/// Configuration file used when running from a checkout.
pub const LOCAL_CONFIG_PATH: &str = "config/default.toml";

/// Where [`ConfigSource::discover`] found the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given on the command line; used even if it does not exist.
    Argument(PathBuf),
    /// Named by [`CONFIG_PATH_ENV`].
    Environment(PathBuf),
    /// [`SYSTEM_CONFIG_PATH`].
    System(PathBuf),
    /// [`LOCAL_CONFIG_PATH`].
    Local(PathBuf),
    /// No file found; built-in defaults.
    Defaults,
}

impl ConfigSource {
    /// Resolve the configuration file, first match wins:
    ///
    /// 1. `explicit` (the `--config` argument)
    /// 2. `env_path` (the value of [`CONFIG_PATH_ENV`]), if the file exists
    /// 3. [`SYSTEM_CONFIG_PATH`], if it exists
    /// 4. [`LOCAL_CONFIG_PATH`], if it exists
    /// 5. Built-in defaults
    #[must_use]
    pub fn discover(explicit: Option<&Path>, env_path: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::Argument(path.to_path_buf());
        }
        if let Some(path) = env_path.filter(|p| p.exists()) {
            return Self::Environment(path.to_path_buf());
        }
        let system = Path::new(SYSTEM_CONFIG_PATH);
        if system.exists() {
            return Self::System(system.to_path_buf());
        }
        let local = Path::new(LOCAL_CONFIG_PATH);
        if local.exists() {
            return Self::Local(local.to_path_buf());
        }
        Self::Defaults
    }

    /// The file to read, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Argument(path)
            | Self::Environment(path)
            | Self::System(path)
            | Self::Local(path) => Some(path.as_path()),
            Self::Defaults => None,
        }
    }

    /// Read the configuration this source points at.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(&self) -> Result<TickwaitConfig, ConfigError> {
        self.path()
            .map_or_else(|| Ok(TickwaitConfig::default()), TickwaitConfig::from_file)
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
