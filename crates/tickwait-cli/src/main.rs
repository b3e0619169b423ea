//! `tickwait` entry point.
//!
//! Runs a sleep workload against emulated accelerator wait hardware on the
//! host: every thread is an independent sleeper issuing timed waits, and the
//! merged outcome is reported as text or JSON.

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tickwait_common::config::{ConfigSource, TickwaitConfig, CONFIG_PATH_ENV};
use tickwait_common::metrics::WaitMetrics;
use tickwait_common::{StrategyKind, Timespec, WaitError};
use tickwait_runtime::{sleep_fully, EmulatedHardware, TimedWait, WaitHardware, WaitStrategy};
use tracing::{debug, info, warn};

use crate::report::{format_json, format_text, WorkloadReport};

/// tickwait command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "tickwait",
    about = "Emulated accelerator timed-wait workload runner",
    version,
    long_about = None
)]
struct Args {
    /// Path to a configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Duration requested by every wait, e.g. `250us` (overrides config).
    #[arg(long, short = 'd', value_parser = humantime::parse_duration)]
    duration: Option<Duration>,

    /// Wait strategy: native, coarse or unsupported (overrides config).
    #[arg(long, short = 's')]
    strategy: Option<StrategyKind>,

    /// Waits per thread (overrides config).
    #[arg(long, short = 'n')]
    iterations: Option<u64>,

    /// Independent sleeper threads (overrides config).
    #[arg(long, short = 't')]
    threads: Option<usize>,

    /// Re-request the remainder after an undershoot.
    #[arg(long)]
    retry: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting tickwait");

    // Load configuration
    let mut config = load_config(&args)?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    info!(
        frequency_hz = config.clock.frequency_hz,
        strategy = %config.emulation.strategy,
        duration = ?config.workload.duration,
        threads = config.workload.threads,
        "Configuration loaded"
    );

    let hardware =
        EmulatedHardware::from_config(&config).context("Failed to configure emulated hardware")?;
    let report = run_workload(&config, &hardware)?;

    if args.json {
        println!("{}", format_json(&report).context("Failed to serialize report")?);
    } else {
        print!("{}", format_text(&report));
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} waits were incomplete",
            report.incomplete(),
            report.metrics.total_waits
        );
    }

    info!("Workload complete");
    Ok(())
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("tickwait={level},tickwait_runtime={level},tickwait_common={level}");

    // Logs go to stderr so the report on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// See [`ConfigSource::discover`] for the resolution order.
fn load_config(args: &Args) -> Result<TickwaitConfig> {
    let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    if let Some(path) = env_path.as_deref().filter(|p| !p.exists()) {
        warn!(
            path = %path.display(),
            "{CONFIG_PATH_ENV} set but file does not exist, checking other locations"
        );
    }

    let source = ConfigSource::discover(args.config.as_deref(), env_path.as_deref());
    match source.path() {
        Some(path) => info!(?source, "Loading config from {}", path.display()),
        None => info!("No config file found, using built-in defaults"),
    }
    source
        .load()
        .with_context(|| format!("Failed to load config from {source:?}"))
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut TickwaitConfig, args: &Args) {
    if let Some(duration) = args.duration {
        config.workload.duration = duration;
    }
    if let Some(strategy) = args.strategy {
        config.emulation.strategy = strategy;
    }
    if let Some(iterations) = args.iterations {
        config.workload.iterations = iterations;
    }
    if let Some(threads) = args.threads {
        config.workload.threads = threads;
    }
    if args.retry {
        config.retry.enabled = true;
    }
}

/// Per-thread result of a sleeper.
struct SleeperOutcome {
    metrics: WaitMetrics,
    attempts: u64,
}

/// Run every sleeper thread to completion and merge their metrics.
fn run_workload(config: &TickwaitConfig, hardware: &EmulatedHardware) -> Result<WorkloadReport> {
    let sleeper = TimedWait::new(hardware, config.emulation.strategy);
    let rate = sleeper
        .clock_rate()
        .context("Emulated clock rejected by the timed wait")?;
    let requested = Timespec::from(config.workload.duration);
    let threads = config.workload.threads;

    let started = Instant::now();
    let outcomes = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|id| {
                let sleeper = &sleeper;
                scope.spawn(move || run_sleeper(id, sleeper, requested, config))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| anyhow::anyhow!("Sleeper thread panicked"))
            })
            .collect::<Result<Vec<_>>>()
    })?;
    let wall_time = started.elapsed();

    let mut merged = WaitMetrics::new(config.metrics.histogram_size);
    let mut attempts = 0u64;
    for outcome in outcomes {
        let outcome = outcome.context("Timed wait rejected its arguments")?;
        merged.merge(&outcome.metrics);
        attempts += outcome.attempts;
    }

    let percentiles: &[f64] = if config.metrics.enabled {
        &config.metrics.percentiles
    } else {
        &[]
    };

    let report = WorkloadReport {
        strategy: config.emulation.strategy,
        frequency_hz: rate.frequency_hz(),
        tick_rate_ns: rate.tick_rate(),
        requested_ns: requested.as_nanos_saturating(),
        threads,
        iterations: config.workload.iterations,
        attempts,
        wall_time_ns: u64::try_from(wall_time.as_nanos()).unwrap_or(u64::MAX),
        metrics: merged.snapshot(),
        percentiles: Vec::new(),
    }
    .with_metrics(&merged, percentiles);

    info!(
        completed = report.metrics.completed,
        incomplete = report.incomplete(),
        mean_overshoot_ns = report.metrics.mean_overshoot_ns.unwrap_or(0),
        wall_ms = wall_time.as_millis(),
        "Workload finished"
    );
    Ok(report)
}

/// One independent sleeper issuing `config.workload.iterations` waits.
fn run_sleeper<H, S>(
    id: usize,
    sleeper: &TimedWait<H, S>,
    requested: Timespec,
    config: &TickwaitConfig,
) -> Result<SleeperOutcome, WaitError>
where
    H: WaitHardware,
    S: WaitStrategy,
{
    let mut metrics = WaitMetrics::new(config.metrics.histogram_size);
    let mut attempts = 0u64;

    for _ in 0..config.workload.iterations {
        let result = if config.retry.enabled {
            match sleep_fully(sleeper, requested, config.retry.max_attempts) {
                Ok(report) => {
                    attempts += u64::from(report.attempts);
                    Ok(report.overshoot_ns())
                }
                Err(err) => {
                    // Only undershoots are retried, and then until exhausted.
                    attempts += if err.is_retryable() {
                        u64::from(config.retry.max_attempts.max(1))
                    } else {
                        1
                    };
                    Err(err)
                }
            }
        } else {
            attempts += 1;
            sleeper
                .wait(&requested, None)
                .map(|report| report.overshoot_ns())
        };

        match result {
            Ok(overshoot_ns) => metrics.record_complete(overshoot_ns),
            Err(WaitError::Undershoot { remaining }) => {
                metrics.record_undershoot(remaining.as_nanos_saturating());
            }
            Err(WaitError::Unsupported { .. }) => metrics.record_unsupported(),
            Err(err @ WaitError::InvalidArgument(_)) => return Err(err),
        }
    }

    debug!(
        thread = id,
        completed = metrics.completed(),
        incomplete = metrics.incomplete(),
        "Sleeper finished"
    );
    Ok(SleeperOutcome { metrics, attempts })
}
