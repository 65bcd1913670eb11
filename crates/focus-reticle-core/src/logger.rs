//! Stderr logging for hosts and tools that have no `log` backend of their own.
//!
//! Filtering follows the `RUST_LOG` directive syntax: a comma-separated list
//! of `level` and `target=level` entries, e.g.
//! `warn,focus_reticle_tracking=trace`. The most specific target prefix wins.
//! The reticle itself only talks to the `log` facade.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable read by [`LogFilter::from_env_or`].
pub const LOG_ENV: &str = "RUST_LOG";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LogFilterError {
    #[error("invalid log level `{0}`")]
    Level(String),
    #[error("empty target in directive `{0}`")]
    Target(String),
}

/// Per-target level filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    default: LevelFilter,
    /// Sorted longest target first.
    targets: Vec<(String, LevelFilter)>,
}

impl LogFilter {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>, level: LevelFilter) -> Self {
        let target = target.into();
        self.targets.retain(|(t, _)| *t != target);
        self.targets.push((target, level));
        self.targets
            .sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        self
    }

    /// Directives from [`LOG_ENV`] on top of `default`. A malformed variable
    /// is reported on stderr and ignored.
    pub fn from_env_or(default: LevelFilter) -> Self {
        let Ok(spec) = std::env::var(LOG_ENV) else {
            return Self::new(default);
        };
        match Self::new(default).parse_directives(&spec) {
            Ok(filter) => filter,
            Err(err) => {
                eprintln!("ignoring {LOG_ENV}: {err}");
                Self::new(default)
            }
        }
    }

    fn parse_directives(mut self, spec: &str) -> Result<Self, LogFilterError> {
        for directive in spec.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                None => self.default = parse_level(directive)?,
                Some((target, level)) => {
                    let target = target.trim();
                    if target.is_empty() {
                        return Err(LogFilterError::Target(directive.to_string()));
                    }
                    self = self.with_target(target, parse_level(level)?);
                }
            }
        }
        Ok(self)
    }

    /// Level that applies to records from `target`.
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.targets
            .iter()
            .find(|(prefix, _)| matches_target(target, prefix))
            .map_or(self.default, |(_, level)| *level)
    }

    /// Most verbose level any directive allows.
    pub fn max_level(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|(_, level)| *level)
            .fold(self.default, Ord::max)
    }
}

impl FromStr for LogFilter {
    type Err = LogFilterError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        Self::new(LevelFilter::Error).parse_directives(spec)
    }
}

fn parse_level(raw: &str) -> Result<LevelFilter, LogFilterError> {
    let raw = raw.trim();
    LevelFilter::from_str(raw).map_err(|_| LogFilterError::Level(raw.to_string()))
}

/// `target` equals `prefix` or lives in a module below it.
fn matches_target(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

struct StderrLogger {
    filter: LogFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let _ = writeln!(
            std::io::stderr().lock(),
            "[{:7.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger with `filter`. Later calls are no-ops.
pub fn init_with_filter(filter: LogFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let max = filter.max_level();
    let logger = LOGGER.get_or_init(|| StderrLogger {
        filter,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(max);
    Ok(())
}

/// Install the stderr logger at `level`, refined by any [`LOG_ENV`] directives.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_with_filter(LogFilter::from_env_or(level))
}

/// Install a `tracing` subscriber. [`LOG_ENV`] wins when set, otherwise
/// everything at `level` and above is shown.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_ascii_lowercase()));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
