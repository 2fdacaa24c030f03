//! Configuration types for watchfor.
//!
//! [`AppConfig`] is the file/CLI facing model. It is converted into the
//! immutable runtime [`crate::watch::WatchConfig`] before a run starts.

use super::defaults::DEFAULT_INTERVAL_SECS;
use crate::watch::{EventKind, WatchMode};
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// What to run and when to stop
    pub watch: WatchSettings,
    /// Commands to run on watch events
    pub callbacks: CallbackConfig,
    /// Progress and event stream output
    pub output: OutputConfig,
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.config.watch.command = Some(command.into());
        self
    }

    pub fn interval_secs(mut self, secs: f64) -> Self {
        self.config.watch.interval = secs;
        self
    }

    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.config.watch.timeout = Some(secs);
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.config.watch.count = Some(count);
        self
    }

    pub fn flappings(mut self, flappings: u64) -> Self {
        self.config.watch.flappings = Some(flappings);
        self
    }

    pub fn mode(mut self, mode: WatchMode) -> Self {
        self.config.watch.mode = mode;
        self
    }

    pub fn callback(mut self, kind: EventKind, command: impl Into<String>) -> Self {
        *self.config.callbacks.slot_mut(kind) = Some(command.into());
        self
    }

    pub fn progress(mut self, level: u8) -> Self {
        self.config.output.progress = level;
        self
    }

    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Watch Settings
// ============================================================================

/// The watched command and its budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WatchSettings {
    /// Command to execute on every iteration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Seconds to sleep between iterations
    pub interval: f64,
    /// Seconds before the run is stopped with a timeout event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    /// Maximum number of iterations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Outcome transitions required before a change run resolves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flappings: Option<u64>,
    /// Termination policy: success, fail, change, monitor
    pub mode: WatchMode,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            command: None,
            interval: DEFAULT_INTERVAL_SECS,
            timeout: None,
            count: None,
            flappings: None,
            mode: WatchMode::default(),
        }
    }
}

// ============================================================================
// Callbacks
// ============================================================================

/// Callback command per event kind. Unset entries are silently skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CallbackConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_fail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_change: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_overcount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_heartbeat: Option<String>,
}

impl CallbackConfig {
    /// The command configured for `kind`, if any.
    #[must_use]
    pub fn command_for(&self, kind: EventKind) -> Option<&str> {
        match kind {
            EventKind::Success => self.on_success.as_deref(),
            EventKind::Fail => self.on_fail.as_deref(),
            EventKind::Change => self.on_change.as_deref(),
            EventKind::Timeout => self.on_timeout.as_deref(),
            EventKind::Overcount => self.on_overcount.as_deref(),
            EventKind::Heartbeat => self.on_heartbeat.as_deref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, kind: EventKind) -> &mut Option<String> {
        match kind {
            EventKind::Success => &mut self.on_success,
            EventKind::Fail => &mut self.on_fail,
            EventKind::Change => &mut self.on_change,
            EventKind::Timeout => &mut self.on_timeout,
            EventKind::Overcount => &mut self.on_overcount,
            EventKind::Heartbeat => &mut self.on_heartbeat,
        }
    }

    /// Number of configured callbacks.
    #[must_use]
    pub fn configured_count(&self) -> usize {
        EventKind::ALL
            .iter()
            .filter(|k| self.command_for(**k).is_some())
            .count()
    }
}

// ============================================================================
// Output
// ============================================================================

/// Format of the per-iteration event stream.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    /// Human-oriented progress characters or lines
    #[default]
    Text,
    /// One JSON object per line (NDJSON)
    Json,
}

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Progress detail: 1 prints one character per iteration, 2+ prints a line
    pub progress: u8,
    /// Diagnostic detail (0 warn, 1 info, 2 debug, 3+ trace)
    pub verbosity: u8,
    /// Event stream format
    pub format: EventFormat,
    /// Append the event stream to this file instead of stdout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}
