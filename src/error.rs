//! Unified error types for watchfor.
//!
//! Command failures are not errors here: a watched command that exits non-zero
//! (or cannot be launched at all) is an ordinary `false` outcome, and executor
//! faults end the loop with a termination reason instead of an error. The types
//! in this module cover configuration problems and output files that cannot be
//! opened.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for watchfor operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WatchforError {
    /// Invalid or incomplete configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A duration argument could not be parsed
    #[error(
        "invalid duration '{0}': expected seconds (1, 0.5) or a suffixed value like 500ms, 30s, 5m, 1h"
    )]
    InvalidDuration(String),

    /// Config file could not be loaded
    #[error("Config file error: {context}")]
    ConfigFile {
        context: String,
        #[source]
        source: crate::config::ConfigFileError,
    },

    /// A file the run writes to could not be opened or written
    #[error("IO error at {}: {message}", .path.display())]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenient Result type for watchfor operations
pub type Result<T> = std::result::Result<T, WatchforError>;

impl WatchforError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
            source,
        }
    }
}

impl From<crate::config::ConfigFileError> for WatchforError {
    fn from(err: crate::config::ConfigFileError) -> Self {
        Self::ConfigFile {
            context: String::new(),
            source: err,
        }
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context is prepended to any context the error already carries, so a chain
/// like `"loading config: reading .watchfor.yaml"` shows the path through the code.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<WatchforError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

fn add_context_to_error(err: WatchforError, new_ctx: &str) -> WatchforError {
    match err {
        WatchforError::Config(msg) => WatchforError::Config(chain_context(new_ctx, &msg)),
        WatchforError::ConfigFile { context, source } => WatchforError::ConfigFile {
            context: chain_context(new_ctx, &context),
            source,
        },
        WatchforError::Io {
            path,
            message,
            source,
        } => WatchforError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        // The offending input is the whole message; leave it alone.
        other @ WatchforError::InvalidDuration(_) => other,
    }
}

/// Join two context strings as "`new`: `existing`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}
