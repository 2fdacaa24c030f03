//! Configuration validation for watchfor.

use super::types::{AppConfig, CallbackConfig, OutputConfig, WatchSettings};
use crate::watch::EventKind;

// ============================================================================
// Configuration Error
// ============================================================================

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.watch.validate());
        errors.extend(self.callbacks.validate());
        errors.extend(self.output.validate());
        errors
    }
}

fn check_seconds(field: &str, value: f64, errors: &mut Vec<ConfigError>) {
    if !value.is_finite() || value < 0.0 {
        errors.push(ConfigError::new(
            field,
            format!("must be a non-negative number of seconds, got {value}"),
        ));
    }
}

impl Validatable for WatchSettings {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Some(ref command) = self.command {
            if command.trim().is_empty() {
                errors.push(ConfigError::new("watch.command", "must not be empty"));
            }
        }

        check_seconds("watch.interval", self.interval, &mut errors);
        if let Some(timeout) = self.timeout {
            check_seconds("watch.timeout", timeout, &mut errors);
        }

        errors
    }
}

impl Validatable for CallbackConfig {
    fn validate(&self) -> Vec<ConfigError> {
        EventKind::ALL
            .iter()
            .filter(|kind| self.command_for(**kind).is_some_and(|c| c.trim().is_empty()))
            .map(|kind| ConfigError::new(format!("callbacks.on_{kind}"), "must not be empty"))
            .collect()
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Some(ref file_path) = self.file {
            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(ConfigError::new(
                        "output.file",
                        format!("Parent directory does not exist: {}", parent.display()),
                    ));
                }
            }
        }

        errors
    }
}
