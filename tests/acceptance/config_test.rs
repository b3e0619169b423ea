//! Configuration acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - A TOML file on disk drives the emulated hardware
//! - Unreadable, malformed or out-of-range files are rejected with context

use std::io::Write;
use std::time::Duration;
use tickwait_common::config::{ConfigError, TickwaitConfig};
use tickwait_runtime::{
    EmulatedHardware, FixedFrequencyClock, StrategyKind, TimedWait, Timespec, WaitHardware,
};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_config_file_drives_emulation() {
    let file = write_config(
        r#"
        [clock]
        frequency_hz = 50000000

        [emulation]
        strategy = "coarse"
        native_sleep = false

        [workload]
        duration = "30us"
        iterations = 5
        "#,
    );

    let config = TickwaitConfig::from_file(file.path()).unwrap();
    assert_eq!(config.emulation.strategy, StrategyKind::Coarse);
    assert_eq!(config.workload.duration, Duration::from_micros(30));

    let hw = EmulatedHardware::from_config(&config).unwrap();
    assert_eq!(hw.frequency_hz(), 50_000_000);
    assert!(!hw.native_sleep_available());

    let sleeper = TimedWait::new(&hw, config.emulation.strategy);
    let report = sleeper
        .wait(&Timespec::from(config.workload.duration), None)
        .unwrap();
    assert!(report.elapsed_ns >= 30_000);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = TickwaitConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_malformed_file() {
    let file = write_config("[clock\nfrequency_hz = ");
    assert!(matches!(
        TickwaitConfig::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));

    let file = write_config("[emulation]\nstrategy = \"spin\"\n");
    assert!(matches!(
        TickwaitConfig::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_out_of_range_rejected_by_hardware() {
    let file = write_config("[emulation]\nnative_sleep_ratio = 3.5\n");
    let config = TickwaitConfig::from_file(file.path()).unwrap();

    let err = EmulatedHardware::from_config(&config).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("native_sleep_ratio"));
}

#[test]
fn test_saved_config_reloads() {
    let mut config = TickwaitConfig::default();
    config.retry.enabled = true;
    config.workload.threads = 6;

    let file = write_config(&config.to_toml().unwrap());
    let loaded = TickwaitConfig::from_file(file.path()).unwrap();

    assert!(loaded.retry.enabled);
    assert_eq!(loaded.workload.threads, 6);
    assert_eq!(loaded.workload.duration, config.workload.duration);
}
