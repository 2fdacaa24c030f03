//! Command execution.
//!
//! [`CommandExecutor`] is the seam between the watch loop and the operating
//! system. [`ShellExecutor`] runs command strings through the platform shell;
//! [`ScriptedExecutor`] replays preset exit codes and records every invocation,
//! which makes watch runs deterministic in tests.

mod scripted;
mod shell;

pub use scripted::{Invocation, ScriptedExecutor};
pub use shell::ShellExecutor;

/// Exit code reported when a command cannot be launched at all.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 127;

/// Result of one completed command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Output of a command that exited with `exit_code` and printed nothing.
    #[must_use]
    pub const fn from_exit_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }

    /// Boolean outcome of the execution: `true` iff the exit code is zero.
    ///
    /// Everything downstream of the executor works with this value only.
    #[must_use]
    pub const fn outcome(&self) -> bool {
        self.exit_code == 0
    }
}

/// Faults that happen after a command was successfully spawned.
///
/// Launch failures are not represented here; they are reported as
/// [`LAUNCH_FAILURE_EXIT_CODE`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExecutorError {
    #[error("failed to collect output of '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("script exhausted after {0} invocation(s)")]
    ScriptExhausted(usize),
}

/// Trait for synchronously running command strings.
///
/// `env` holds extra environment variables for the child process. The call
/// blocks until the command has exited.
pub trait CommandExecutor {
    fn run(
        &mut self,
        command: &str,
        env: &[(String, String)],
    ) -> Result<CommandOutput, ExecutorError>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &mut E {
    fn run(
        &mut self,
        command: &str,
        env: &[(String, String)],
    ) -> Result<CommandOutput, ExecutorError> {
        (**self).run(command, env)
    }
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for Box<E> {
    fn run(
        &mut self,
        command: &str,
        env: &[(String, String)],
    ) -> Result<CommandOutput, ExecutorError> {
        (**self).run(command, env)
    }
}
