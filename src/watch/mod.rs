//! Repeated command execution with mode-based termination.
//!
//! The [`WatchLoop`] runs a command on a fixed interval, converts each exit
//! code into a boolean outcome, and lets the [`mode`] state machine decide
//! whether the run is resolved. Callback commands fire on success, fail,
//! change, timeout, overcount and heartbeat events.
//!
//! ```
//! use std::time::Duration;
//! use watchfor::executor::ScriptedExecutor;
//! use watchfor::watch::{WatchConfig, WatchLoop, WatchMode};
//!
//! let config = WatchConfig::new("probe")
//!     .with_interval(Duration::ZERO)
//!     .with_mode(WatchMode::Change);
//! let mut engine = WatchLoop::new(&config, ScriptedExecutor::new("probe", vec![0, 0, 1]));
//! let report = engine.run();
//! assert_eq!(report.exit_status(), 0);
//! assert_eq!(report.iterations, 2);
//! ```

pub(crate) mod config;
pub(crate) mod dispatch;
pub(crate) mod events;
pub(crate) mod loop_impl;
pub mod mode;
pub(crate) mod observers;
pub(crate) mod state;

pub use config::{parse_duration, WatchConfig};
pub use events::{EventKind, WatchEvent};
pub use loop_impl::{run_watch_loop, WatchLoop};
pub use mode::{evaluate, Decision, FlappingCounters, WatchMode};
pub use observers::{build_observers, NdjsonEventSink, ProgressPrinter, WatchObserver};
pub use state::{RunReport, Termination, WatchState};
