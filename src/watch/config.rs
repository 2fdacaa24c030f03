//! Runtime watch configuration and duration parsing.

use crate::config::{AppConfig, CallbackConfig, OutputConfig, DEFAULT_INTERVAL};
use crate::error::{Result, WatchforError};
use super::mode::WatchMode;
use std::time::Duration;

/// Immutable configuration of one watch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Command executed on every iteration
    pub command: String,
    /// Sleep between iterations
    pub interval: Duration,
    /// Total elapsed-time budget
    pub timeout: Option<Duration>,
    /// Iteration budget
    pub max_iterations: Option<u64>,
    /// Transitions required before a change run resolves
    pub flapping_threshold: Option<u64>,
    pub mode: WatchMode,
    pub callbacks: CallbackConfig,
    pub output: OutputConfig,
}

impl WatchConfig {
    /// Watch `command` in success mode with a one second interval.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            interval: DEFAULT_INTERVAL,
            timeout: None,
            max_iterations: None,
            flapping_threshold: None,
            mode: WatchMode::default(),
            callbacks: CallbackConfig::default(),
            output: OutputConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// A zero timeout counts as unset.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// A zero count counts as unset.
    #[must_use]
    pub fn with_max_iterations(mut self, count: Option<u64>) -> Self {
        self.max_iterations = count.filter(|n| *n > 0);
        self
    }

    /// A zero threshold counts as unset.
    #[must_use]
    pub fn with_flapping_threshold(mut self, flappings: Option<u64>) -> Self {
        self.flapping_threshold = flappings.filter(|n| *n > 0);
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: WatchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_callbacks(mut self, callbacks: CallbackConfig) -> Self {
        self.callbacks = callbacks;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }
}

impl TryFrom<&AppConfig> for WatchConfig {
    type Error = WatchforError;

    fn try_from(app: &AppConfig) -> Result<Self> {
        let settings = &app.watch;
        let command = settings
            .command
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| WatchforError::config("no command to watch"))?;

        let interval = seconds("interval", settings.interval)?;
        let timeout = settings
            .timeout
            .map(|t| seconds("timeout", t))
            .transpose()?;

        Ok(Self::new(command)
            .with_interval(interval)
            .with_timeout(timeout)
            .with_max_iterations(settings.count)
            .with_flapping_threshold(settings.flappings)
            .with_mode(settings.mode)
            .with_callbacks(app.callbacks.clone())
            .with_output(app.output.clone()))
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        WatchforError::config(format!(
            "{field} must be a non-negative number of seconds, got {value}"
        ))
    })
}

/// Parse a duration given on the command line.
///
/// A bare number is seconds and may be fractional (`1`, `0.5`). Suffixed
/// values accept `ms`, `s`, `m`, `h` and `d`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use watchfor::watch::parse_duration;
///
/// assert_eq!(parse_duration("0.5").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let invalid = || WatchforError::InvalidDuration(s.to_string());
    if s.is_empty() {
        return Err(invalid());
    }

    let (num_str, scale) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, 0.001)
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 1.0)
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 60.0)
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 3600.0)
    } else if let Some(stripped) = s.strip_suffix('d') {
        (stripped, 86_400.0)
    } else {
        (s, 1.0)
    };

    let value: f64 = num_str.trim().parse().map_err(|_| invalid())?;
    Duration::try_from_secs_f64(value * scale).map_err(|_| invalid())
}
