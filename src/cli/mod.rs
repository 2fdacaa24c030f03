//! CLI command handlers.
//!
//! Testable handlers invoked by main.rs.

mod watch;

pub use watch::{resolve_config, run_watch, CliOverrides};
