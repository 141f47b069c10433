//! DVCS Logging
//!
//! Installs a `tracing` subscriber configured from `DVCS_*` environment
//! variables. Library crates log through `tracing` macros; binaries and tests
//! call [`init`] once.
//!
//! # Environment Variables
//!
//! - `DVCS_DEBUG=1` - Enable debug logging
//! - `DVCS_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `DVCS_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `DVCS_LOG_COLOR=1|0` - Enable/disable colors
//!
//! `RUST_LOG`, when set, takes precedence over the level.
//!
//! # Usage
//!
//! ```rust,no_run
//! dvcs_log::init();
//! tracing::info!(repository_id = "repo-1", "Dispatching event");
//! ```

use std::env;
use std::str::FromStr;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, EnvFilter};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level
    Warn,
    /// Error level
    Error,
    /// Off (no logging)
    Off,
}

impl Level {
    /// Directive understood by `EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human readable format
    Pretty,
    /// Single-line format
    Compact,
    /// JSON lines for log shipping
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether to emit ANSI colors
    pub color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            color: false,
        }
    }
}

impl LogConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through a variable lookup.
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| {
            lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        };

        let debug = flag("DVCS_DEBUG").unwrap_or(false);

        let level = lookup("DVCS_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup("DVCS_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Format::Json);

        let color = flag("DVCS_LOG_COLOR")
            .unwrap_or_else(|| lookup("NO_COLOR").is_none() && lookup("TERM").is_some());

        Self {
            level,
            format,
            color,
        }
    }

    /// Filter for this configuration; `RUST_LOG` wins when set and valid.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_directive()))
    }

    /// Install the global subscriber.
    pub fn try_init(&self) -> Result<(), TryInitError> {
        let registry = tracing_subscriber::registry().with(self.env_filter());

        match self.format {
            Format::Json => registry
                .with(fmt::layer().json().with_current_span(false))
                .try_init(),
            Format::Pretty => registry
                .with(fmt::layer().pretty().with_ansi(self.color))
                .try_init(),
            Format::Compact => registry
                .with(fmt::layer().compact().with_ansi(self.color))
                .try_init(),
        }
    }
}

/// Install the global subscriber from the environment.
///
/// Calling it again after a subscriber is installed has no effect.
pub fn init() {
    let _ = LogConfig::from_env().try_init();
}
