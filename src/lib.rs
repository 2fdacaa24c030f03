//! **Run a command on an interval and react to how its outcome evolves.**
//!
//! `watchfor` executes a shell command repeatedly, reduces each run to a
//! success/failure outcome (exit code zero or not), and stops according to a
//! [`WatchMode`]: when the command succeeds, when it fails, when its outcome
//! changes (optionally only after a number of flappings), or never, leaving
//! the time and iteration budgets to end the run.
//!
//! Along the way it fires events (`success`, `fail`, `change`, `timeout`,
//! `overcount`, `heartbeat`), each of which may run a configured callback
//! command. The process exit status is `0` when the watched condition was met
//! and `1` otherwise.
//!
//! ## Core Concepts & Modules
//!
//! - **[`watch`]**: the loop engine ([`WatchLoop`]), the mode/flapping state
//!   machine ([`watch::evaluate`]), events, observers and the [`RunReport`].
//! - **[`executor`]**: the [`CommandExecutor`] seam with a shell implementation
//!   and a scripted one for deterministic tests.
//! - **[`config`]**: YAML config file model, discovery and validation.
//! - **[`cli`]**: handlers used by the `watchfor` binary.
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use watchfor::{ScriptedExecutor, WatchConfig, WatchLoop, WatchMode};
//!
//! let config = WatchConfig::new("probe")
//!     .with_interval(Duration::ZERO)
//!     .with_mode(WatchMode::Fail);
//! let mut engine = WatchLoop::new(&config, ScriptedExecutor::new("probe", vec![0, 0, 3]));
//! let report = engine.run();
//!
//! assert!(report.succeeded);
//! assert_eq!(report.iterations, 2);
//! ```

#![warn(clippy::unwrap_used)]
#![allow(
    // Exit codes and counters cross between i32/u64/f64 in reports
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod watch;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, CallbackConfig, EventFormat, OutputConfig};
pub use config::{ConfigError, Validatable};
pub use error::{ErrorContext, Result, WatchforError};
pub use executor::{CommandExecutor, CommandOutput, ScriptedExecutor, ShellExecutor};
pub use watch::{
    EventKind, RunReport, Termination, WatchConfig, WatchEvent, WatchLoop, WatchMode,
    WatchObserver,
};
